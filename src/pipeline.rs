//! Per-tile processing: slice, augment, sketch, normalize.
//!
//! Every stage takes a lazy sequence of tiles and returns one, so stages
//! chain without materializing the whole dataset. Inside a tile the steps
//! run in a fixed order (slice, combine, transform, re-associate), because
//! each needs the object list produced by the one before.
//!
//! Geometries of a tile travel through transforms as one combined
//! collection; element `i` of the result must belong to object `i`. That
//! correspondence is checked before ids and tags are paired with the new
//! geometries, and a mismatch fails the tile instead of misaligning it.

use std::sync::atomic::{AtomicUsize, Ordering};

use geo::{Geometry, Rect};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::affine::{self, VARIANT_COUNT};
use crate::distort::{distort_geometry, DistortParams};
use crate::error::{ExportError, PipelineError};
use crate::geometry::{combine, decompose};
use crate::seeds::RunSeeds;
use crate::tile::Tile;

// =============================================================================
// SLICE
// =============================================================================

/// Keep only polygon objects tagged as buildings.
pub fn slice_tile(tile: Tile) -> Tile {
    let Tile {
        coord,
        variant,
        objects,
    } = tile;

    Tile {
        coord,
        variant,
        objects: objects
            .into_iter()
            .filter(|o| o.is_polygon() && o.is_building())
            .collect(),
    }
}

/// One sliced tile per input tile. Tiles left empty are still emitted.
pub fn slice<I>(tiles: I) -> impl Iterator<Item = Tile>
where
    I: IntoIterator<Item = Tile>,
{
    tiles.into_iter().map(slice_tile)
}

// =============================================================================
// AUGMENTATION
// =============================================================================

/// Combine a tile's geometries into one collection, in object order.
fn combined_geometry(tile: &Tile) -> Geometry<f64> {
    Geometry::GeometryCollection(combine(tile.objects.iter().map(|o| o.geom.clone())))
}

/// Pair a transformed collection back with the tile's objects.
fn reassociate(
    tile: &Tile,
    variant: Option<usize>,
    transformed: Geometry<f64>,
) -> Result<Tile, PipelineError> {
    let geoms = decompose(transformed);
    if geoms.len() != tile.len() {
        return Err(PipelineError::ObjectCountMismatch {
            tile: tile.coord,
            expected: tile.len(),
            actual: geoms.len(),
        });
    }
    Ok(tile.rebuild(variant, geoms))
}

/// The 75 augmented copies of a tile.
///
/// All objects are transformed together about the centroid of the whole
/// tile, so their relative layout is kept. Variant `i` corresponds to entry
/// `i` of [`affine::variant_specs`].
pub fn make_variants(tile: &Tile) -> Result<Vec<Tile>, PipelineError> {
    let generated = affine::variants(&combined_geometry(tile));
    if generated.len() != VARIANT_COUNT {
        return Err(PipelineError::VariantCountMismatch {
            tile: tile.coord,
            expected: VARIANT_COUNT,
            actual: generated.len(),
        });
    }

    generated
        .into_iter()
        .enumerate()
        .map(|(index, geometry)| reassociate(tile, Some(index), geometry))
        .collect()
}

/// Augmented copies of every tile. A tile that fails yields a single
/// error in place of its variants; later tiles are unaffected.
pub fn variants<I>(tiles: I) -> impl Iterator<Item = Result<Tile, PipelineError>>
where
    I: IntoIterator<Item = Tile>,
{
    tiles.into_iter().flat_map(|tile| match make_variants(&tile) {
        Ok(variants) => variants.into_iter().map(Ok).collect::<Vec<_>>(),
        Err(err) => vec![Err(err)],
    })
}

// =============================================================================
// SKETCH
// =============================================================================

/// Replace every object's geometry with its hand-drawn rendering.
pub fn sketch_tile<R: Rng + ?Sized>(
    tile: &Tile,
    params: &DistortParams,
    rng: &mut R,
) -> Result<Tile, PipelineError> {
    let geoms = tile
        .objects
        .iter()
        .map(|object| {
            distort_geometry(&object.geom, params, &mut *rng).map_err(|source| {
                PipelineError::Distort {
                    tile: tile.coord,
                    object_id: object.id.clone(),
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tile.rebuild(tile.variant, geoms))
}

/// Sketch a stream of tiles. Each tile draws from its own generator,
/// seeded from its coordinate and variant index, so output does not depend
/// on processing order. Errors already in the stream pass through.
pub fn sketch<I>(
    tiles: I,
    params: DistortParams,
    seeds: RunSeeds,
) -> impl Iterator<Item = Result<Tile, PipelineError>>
where
    I: IntoIterator<Item = Result<Tile, PipelineError>>,
{
    tiles.into_iter().map(move |tile| {
        let tile = tile?;
        let mut rng = ChaCha8Rng::seed_from_u64(seeds.tile_seed(&tile.coord, tile.variant));
        sketch_tile(&tile, &params, &mut rng)
    })
}

// =============================================================================
// NORMALIZATION
// =============================================================================

/// Stretch a tile's objects, together, so their combined bounding box
/// fills `target`.
pub fn fit_tile(tile: &Tile, target: &Rect<f64>) -> Result<Tile, PipelineError> {
    let fitted = affine::fit(&combined_geometry(tile), target).map_err(|source| {
        PipelineError::Transform {
            tile: tile.coord,
            source,
        }
    })?;
    reassociate(tile, tile.variant, fitted)
}

// =============================================================================
// PARALLEL DRIVER
// =============================================================================

/// What to do with each tile after augmentation
#[derive(Clone, Debug, Default)]
pub struct ProcessOptions {
    /// Sketch every variant with these parameters
    pub sketch: Option<DistortParams>,
    /// Seeds for the sketch stage, shared by every tile of the run
    pub seeds: RunSeeds,
    /// Fit every variant into this box
    pub normalize: Option<Rect<f64>>,
}

/// Counters from a parallel run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Tiles taken from the input
    pub tiles_in: usize,
    /// Tiles handed to the sink successfully
    pub tiles_out: usize,
    /// Input tiles skipped because processing failed
    pub failed_tiles: usize,
    /// Output tiles the sink rejected
    pub failed_writes: usize,
}

/// Augment (and optionally sketch and normalize) a single tile.
pub fn process_tile(tile: &Tile, options: &ProcessOptions) -> Result<Vec<Tile>, PipelineError> {
    let mut out = make_variants(tile)?;

    if let Some(params) = &options.sketch {
        out = sketch(out.into_iter().map(Ok), params.clone(), options.seeds.clone())
            .collect::<Result<_, _>>()?;
    }

    if let Some(target) = &options.normalize {
        out = out
            .iter()
            .map(|variant| fit_tile(variant, target))
            .collect::<Result<_, _>>()?;
    }

    Ok(out)
}

/// Process tiles in parallel and hand every result to `sink`.
///
/// Tiles are independent, so they run on the rayon pool in no particular
/// order. A failing tile is logged and counted, never fatal to the run.
pub fn process_parallel<I, F>(tiles: I, options: &ProcessOptions, sink: F) -> RunStats
where
    I: Iterator<Item = Tile> + Send,
    F: Fn(&Tile) -> Result<(), ExportError> + Sync,
{
    let tiles_in = AtomicUsize::new(0);
    let tiles_out = AtomicUsize::new(0);
    let failed_tiles = AtomicUsize::new(0);
    let failed_writes = AtomicUsize::new(0);

    tiles.par_bridge().for_each(|tile| {
        tiles_in.fetch_add(1, Ordering::Relaxed);

        match process_tile(&tile, options) {
            Ok(outputs) => {
                debug!(tile = %tile.coord, variants = outputs.len(), "processed tile");
                for output in &outputs {
                    match sink(output) {
                        Ok(()) => {
                            tiles_out.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => {
                            warn!(
                                tile = %output.coord,
                                variant = ?output.variant,
                                error = %err,
                                "write failed"
                            );
                            failed_writes.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            }
            Err(err) => {
                warn!(tile = %err.tile(), error = %err, "skipping tile");
                failed_tiles.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    RunStats {
        tiles_in: tiles_in.into_inner(),
        tiles_out: tiles_out.into_inner(),
        failed_tiles: failed_tiles.into_inner(),
        failed_writes: failed_writes.into_inner(),
    }
}
