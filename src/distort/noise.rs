//! Coherent 1-D noise for the wobble stage.

use std::f64::consts::TAU;

use noise::{NoiseFn, Perlin, Seedable};

/// A smooth, deterministic 1-D noise function with output in `[-1, 1]`.
pub trait CoherentNoise {
    fn sample(&self, t: f64) -> f64;
}

/// Perlin noise that repeats every `period` units.
///
/// The 1-D parameter is wrapped onto a circle of circumference `period`
/// inside 2-D Perlin space, so `sample(t) == sample(t + period)` and the
/// feature size stays at one lattice cell per unit of `t`.
#[derive(Clone, Debug)]
pub struct PeriodicPerlin {
    perlin: Perlin,
    period: f64,
}

impl PeriodicPerlin {
    pub fn new(seed: u32, period: f64) -> Self {
        Self {
            perlin: Perlin::new(1).set_seed(seed),
            period,
        }
    }
}

impl CoherentNoise for PeriodicPerlin {
    fn sample(&self, t: f64) -> f64 {
        let angle = TAU * t.rem_euclid(self.period) / self.period;
        let radius = self.period / TAU;
        self.perlin
            .get([radius * angle.cos(), radius * angle.sin()])
            .clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic() {
        let noise = PeriodicPerlin::new(7, 1024.0);
        for t in [0.3, 17.25, 511.9, 1000.1] {
            assert!((noise.sample(t) - noise.sample(t + 1024.0)).abs() < 1e-9);
            assert!((noise.sample(t) - noise.sample(t + 3.0 * 1024.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_range_and_determinism() {
        let a = PeriodicPerlin::new(42, 1024.0);
        let b = PeriodicPerlin::new(42, 1024.0);
        for i in 0..500 {
            let t = i as f64 * 7.31;
            let v = a.sample(t);
            assert!((-1.0..=1.0).contains(&v));
            assert_eq!(v, b.sample(t));
        }
    }

    #[test]
    fn test_coherent() {
        // Nearby parameters give nearby values
        let noise = PeriodicPerlin::new(3, 1024.0);
        for i in 0..100 {
            let t = i as f64 * 9.7;
            assert!((noise.sample(t) - noise.sample(t + 0.001)).abs() < 0.05);
        }
    }
}
