//! Error types for every stage of the tile pipeline.
//!
//! Failures are scoped: configuration errors stop a run before it starts,
//! everything else is reported per tile (or per object inside a tile) so a
//! streaming run can skip the offender and keep going.

use std::path::PathBuf;

use thiserror::Error;

use crate::tiling::TileCoord;

/// Invalid run configuration, reported before any tile is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Tile size must be a positive, finite number of kilometers
    #[error("invalid tile size: {0} km (must be positive and finite)")]
    InvalidTileSize(f64),

    /// Requested tile size resolves to a zoom level the grid cannot address
    #[error("tile size {km} km needs zoom {zoom}, above the supported maximum of {max}")]
    ZoomOutOfRange { km: f64, zoom: u32, max: u8 },

    /// Bounds string is not four comma-separated numbers
    #[error("malformed bounds '{0}': expected lon,lat,lon,lat")]
    MalformedBounds(String),

    /// Bounds collapse to a line or a point
    #[error("degenerate bounds: west={west} south={south} east={east} north={north}")]
    DegenerateBounds {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },

    /// Normalization target must be a positive, finite extent
    #[error("invalid normalize extent: {0} (must be positive and finite)")]
    InvalidExtent(f64),

    /// Sketch parameters are out of range
    #[error("invalid sketch parameters: {0}")]
    Sketch(#[from] DistortError),

    /// Tiling failed while resolving the plan
    #[error(transparent)]
    Tiling(#[from] TilingError),

    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for `PipelineConfig`
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid tile addressing input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TilingError {
    #[error("zoom {0} exceeds the maximum of {max}", max = crate::tiling::MAX_ZOOM)]
    InvalidZoom(u8),

    #[error("tile ({x}, {y}) is outside the {size}x{size} grid at zoom {zoom}")]
    OutOfGrid { x: u32, y: u32, zoom: u8, size: u64 },
}

/// Affine transform failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Geometry has no coordinates, so no bounds or centroid exist
    #[error("geometry is empty")]
    EmptyGeometry,

    /// Source bounds have zero width or height and cannot be stretched
    #[error("source bounds are degenerate ({width} x {height})")]
    DegenerateBounds { width: f64, height: f64 },
}

/// Hand-drawn distortion failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistortError {
    /// Exterior ring has no coordinates
    #[error("polygon exterior ring is empty")]
    EmptyRing,

    /// A parameter is outside its valid range
    #[error("invalid distortion parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// Self-intersection repair left nothing behind
    #[error("self-intersection repair produced an empty geometry")]
    RepairFailed,
}

/// Per-tile pipeline failure. Sibling tiles are unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The variant generator returned the wrong number of variants
    #[error("tile {tile}: expected {expected} variants, got {actual}")]
    VariantCountMismatch {
        tile: TileCoord,
        expected: usize,
        actual: usize,
    },

    /// A transformed collection lost or gained elements, so ids and tags
    /// cannot be re-associated
    #[error("tile {tile}: {expected} objects in, {actual} geometries out")]
    ObjectCountMismatch {
        tile: TileCoord,
        expected: usize,
        actual: usize,
    },

    /// Distortion of one object failed
    #[error("tile {tile} object {object_id}: {source}")]
    Distort {
        tile: TileCoord,
        object_id: String,
        #[source]
        source: DistortError,
    },

    /// Transform of the tile's combined geometry failed
    #[error("tile {tile}: {source}")]
    Transform {
        tile: TileCoord,
        #[source]
        source: TransformError,
    },
}

impl PipelineError {
    /// Coordinate of the tile that failed
    pub fn tile(&self) -> TileCoord {
        match self {
            Self::VariantCountMismatch { tile, .. }
            | Self::ObjectCountMismatch { tile, .. }
            | Self::Distort { tile, .. }
            | Self::Transform { tile, .. } => *tile,
        }
    }
}

/// Failures loading or querying the object source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse GeoJSON {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("query for tile {tile} failed: {message}")]
    Query { tile: TileCoord, message: String },
}

/// Failures writing tiles to the sink.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode tile {tile}: {source}")]
    Encode {
        tile: TileCoord,
        #[source]
        source: serde_json::Error,
    },
}
