//! The four outline stages: resample, jitter, wobble, smooth.
//!
//! Each stage maps an open point sequence (first point not repeated at the
//! end) to a new one of the same length. The sequence is treated as a
//! closed loop wherever neighbours matter.

use geo::{Coord, LineString};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::noise::CoherentNoise;
use crate::error::DistortError;
use crate::geometry::{bbox_diagonal, resample_ring};

/// Gaussian kernels are cut off at this many sigmas
const KERNEL_TRUNCATE: f64 = 4.0;

/// Re-derive the outline as `n` points at equal arc-length spacing.
///
/// Discards the source vertex density so later stages behave the same for
/// a 4-vertex box and a 400-vertex traced outline.
pub fn resample(ring: &LineString<f64>, n: usize) -> Result<Vec<Coord<f64>>, DistortError> {
    resample_ring(ring, n).ok_or(DistortError::EmptyRing)
}

/// Add independent Gaussian noise to both coordinates of every point.
///
/// Standard deviation is `scale` times the bounding-box diagonal.
pub fn jitter<R: Rng + ?Sized>(
    points: &[Coord<f64>],
    scale: f64,
    rng: &mut R,
) -> Result<Vec<Coord<f64>>, DistortError> {
    let sigma = scale * bbox_diagonal(points);
    let normal = Normal::new(0.0, sigma).map_err(|_| DistortError::InvalidParameter {
        name: "jitter_scale",
        value: scale,
    })?;

    Ok(points
        .iter()
        .map(|p| Coord {
            x: p.x + normal.sample(rng),
            y: p.y + normal.sample(rng),
        })
        .collect())
}

/// Push every edge sideways by one coherent-noise sample.
///
/// Each edge draws a random phase in `[0, phase_range)`, reads the noise
/// there, scales it by `amplitude` times the bounding-box diagonal and moves
/// both of its endpoints along the edge normal. Neighbouring edges share an
/// endpoint, so the displacements chain into a continuous wobble.
/// Zero-length edges are left alone and draw no phase.
pub fn wobble<N, R>(
    points: &[Coord<f64>],
    amplitude: f64,
    noise: &N,
    phase_range: f64,
    rng: &mut R,
) -> Vec<Coord<f64>>
where
    N: CoherentNoise + ?Sized,
    R: Rng + ?Sized,
{
    let diag = bbox_diagonal(points);
    let n = points.len();
    let mut result = points.to_vec();

    for i in 0..n {
        let next = (i + 1) % n;
        let edge = points[next] - points[i];
        let length = edge.x.hypot(edge.y);
        if length == 0.0 {
            continue;
        }

        // Edge rotated a quarter turn counter-clockwise
        let normal = Coord {
            x: -edge.y / length,
            y: edge.x / length,
        };

        let phase = rng.gen::<f64>() * phase_range;
        let offset = amplitude * diag * noise.sample(phase);

        result[i] = result[i] + normal * offset;
        result[next] = result[next] + normal * offset;
    }

    result
}

/// Circular Gaussian smoothing of the x and y sequences.
///
/// The sequence wraps around, so the closing seam is smoothed like any
/// other stretch. `sigma <= 0` leaves the points as they are.
pub fn smooth(points: &[Coord<f64>], sigma: f64) -> Vec<Coord<f64>> {
    if sigma <= 0.0 || points.is_empty() {
        return points.to_vec();
    }

    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;
    let n = points.len() as isize;

    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .fold(Coord { x: 0.0, y: 0.0 }, |acc, (k, &w)| {
                    let j = (i + k as isize - radius).rem_euclid(n) as usize;
                    acc + points[j] * w
                })
        })
        .collect()
}

/// Normalized Gaussian weights over `[-radius, radius]`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (KERNEL_TRUNCATE * sigma + 0.5) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}
