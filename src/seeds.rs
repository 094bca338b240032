//! Seed derivation for reproducible runs
//!
//! Every tile (and every variant of a tile) gets its own generator seed,
//! derived from a master seed. Tiles can then be processed in any order or
//! in parallel and still produce identical output.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::tiling::TileCoord;

/// Seeds for the randomized parts of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Hand-drawn distortion of object outlines
    pub sketch: u64,
}

impl RunSeeds {
    /// Derive all sub-seeds from a master seed.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            sketch: derive_seed(master, "sketch"),
        }
    }

    /// Seed for one tile, or one variant of it.
    pub fn tile_seed(&self, coord: &TileCoord, variant: Option<usize>) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.sketch.hash(&mut hasher);
        coord.hash(&mut hasher);
        variant.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for RunSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

impl std::fmt::Display for RunSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RunSeeds {{ master: {}, sketch: {} }}",
            self.master, self.sketch
        )
    }
}

/// Derive a sub-seed from a master seed and a system name.
fn derive_seed(master: u64, system: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    system.hash(&mut hasher);
    hasher.finish()
}
