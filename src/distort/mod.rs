//! Hand-drawn distortion of building outlines.
//!
//! A polygon's exterior is pushed through four stages, in order:
//! - **Resample**: equal arc-length points, independent of source density
//! - **Jitter**: per-point Gaussian noise scaled to the footprint size
//! - **Wobble**: per-edge coherent-noise offsets along the edge normal
//! - **Smooth**: circular Gaussian smoothing of x and y
//!
//! The result is closed into a polygon and cleaned with a zero-width
//! buffer, which resolves any self-intersections the noise introduced.
//! Interior rings are not carried over. Every random draw comes from the
//! generator passed in, so a seeded generator gives identical output.

pub mod noise;
pub mod params;
pub mod stages;

pub use noise::{CoherentNoise, PeriodicPerlin};
pub use params::{DistortParams, SketchStyle};

use geo::{Coord, Geometry, GeometryCollection, LineString, Polygon};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::DistortError;
use crate::geometry::repair;

/// Upper bound (exclusive) of the seed drawn for the wobble stage
const WOBBLE_SEED_RANGE: u64 = 1_000_000;

/// Run the four stages and return the open, distorted point loop.
///
/// The `i`-th output point is the displaced version of the `i`-th
/// resampled point.
pub fn sketch_points<R: Rng + ?Sized>(
    polygon: &Polygon<f64>,
    params: &DistortParams,
    rng: &mut R,
) -> Result<Vec<Coord<f64>>, DistortError> {
    params.validate()?;

    let points = stages::resample(polygon.exterior(), params.n_resample)?;
    let points = stages::jitter(&points, params.jitter_scale, rng)?;

    // Wobble runs on its own generator so its draws don't interleave with
    // the jitter sequence
    let wobble_seed = rng.gen_range(0..WOBBLE_SEED_RANGE);
    let mut wobble_rng = ChaCha8Rng::seed_from_u64(wobble_seed);
    let noise = PeriodicPerlin::new(wobble_seed as u32, params.noise_period);
    let points = stages::wobble(
        &points,
        params.wobble_amplitude,
        &noise,
        params.phase_range,
        &mut wobble_rng,
    );

    Ok(stages::smooth(&points, params.smooth_sigma))
}

/// Hand-drawn version of a polygon.
///
/// Usually a `Polygon`; a `MultiPolygon` when repair splits a pinched
/// outline. Fails if repair leaves nothing with area.
pub fn distort<R: Rng + ?Sized>(
    polygon: &Polygon<f64>,
    params: &DistortParams,
    rng: &mut R,
) -> Result<Geometry<f64>, DistortError> {
    let points = sketch_points(polygon, params, rng)?;
    let outline = Polygon::new(LineString::from(points), Vec::new());
    repair(outline).ok_or(DistortError::RepairFailed)
}

/// Distort polygons; wrap anything else unchanged in a one-element
/// collection.
pub fn distort_geometry<R: Rng + ?Sized>(
    geometry: &Geometry<f64>,
    params: &DistortParams,
    rng: &mut R,
) -> Result<Geometry<f64>, DistortError> {
    match geometry {
        Geometry::Polygon(polygon) => distort(polygon, params, rng),
        other => Ok(Geometry::GeometryCollection(GeometryCollection::new_from(
            vec![other.clone()],
        ))),
    }
}

/// Lazily distort a sequence of geometries, sharing one generator.
pub fn distort_all<'a, I, R>(
    geometries: I,
    params: &'a DistortParams,
    rng: &'a mut R,
) -> impl Iterator<Item = Result<Geometry<f64>, DistortError>> + 'a
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
    I::IntoIter: 'a,
    R: Rng + ?Sized,
{
    geometries
        .into_iter()
        .map(move |geometry| distort_geometry(geometry, params, &mut *rng))
}
