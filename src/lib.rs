//! Map tile dataset generator
//!
//! Cuts map objects into Web Mercator tiles, keeps the building footprints,
//! and writes every tile as a family of rotated, scaled and mirrored
//! variants, optionally with hand-drawn outlines.

pub mod affine;
pub mod config;
pub mod distort;
pub mod error;
pub mod export;
pub mod geojson;
pub mod geometry;
pub mod pipeline;
pub mod seeds;
pub mod source;
pub mod tile;
pub mod tiling;
