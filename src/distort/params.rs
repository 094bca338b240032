//! Distortion parameters and style presets

use serde::{Deserialize, Serialize};

use crate::error::DistortError;

/// How strongly a footprint is roughened
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SketchStyle {
    /// Barely visible wobble, mostly rounded corners
    Subtle,
    /// Steady hand-drawn look
    #[default]
    Standard,
    /// Shaky freehand outline
    Rough,
}

impl SketchStyle {
    pub fn all() -> &'static [Self] {
        &[Self::Subtle, Self::Standard, Self::Rough]
    }

    /// Parameters for this preset
    pub fn params(&self) -> DistortParams {
        match self {
            Self::Subtle => DistortParams::subtle(),
            Self::Standard => DistortParams::default(),
            Self::Rough => DistortParams::rough(),
        }
    }
}

impl std::fmt::Display for SketchStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subtle => write!(f, "subtle"),
            Self::Standard => write!(f, "standard"),
            Self::Rough => write!(f, "rough"),
        }
    }
}

/// Parameters of the resample, jitter, wobble, smooth chain.
///
/// Amplitudes are fractions of the bounding-box diagonal of the resampled
/// outline, so the effect scales with the footprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortParams {
    /// Number of points the outline is resampled to
    pub n_resample: usize,

    /// Standard deviation of per-point Gaussian jitter
    pub jitter_scale: f64,

    /// Peak per-edge wobble offset
    pub wobble_amplitude: f64,

    /// Wiggles per unit length. Accepted for configuration compatibility;
    /// wobble currently draws one noise sample per edge at a random phase,
    /// so this value has no effect.
    pub wobble_frequency: f64,

    /// Sigma (in points) of the circular Gaussian smoothing
    pub smooth_sigma: f64,

    /// Period of the coherent noise function
    pub noise_period: f64,

    /// Per-edge phases are drawn uniformly from `[0, phase_range)`
    pub phase_range: f64,
}

impl Default for DistortParams {
    fn default() -> Self {
        Self {
            n_resample: 50,
            jitter_scale: 0.008,
            wobble_amplitude: 0.003,
            wobble_frequency: 2.0,
            smooth_sigma: 0.8,
            noise_period: 1024.0,
            phase_range: 10_000.0,
        }
    }
}

impl DistortParams {
    pub fn subtle() -> Self {
        Self {
            jitter_scale: 0.003,
            wobble_amplitude: 0.001,
            smooth_sigma: 1.2,
            ..Default::default()
        }
    }

    pub fn rough() -> Self {
        Self {
            n_resample: 80,
            jitter_scale: 0.015,
            wobble_amplitude: 0.01,
            smooth_sigma: 0.6,
            ..Default::default()
        }
    }

    /// Reject values the stages cannot work with.
    pub fn validate(&self) -> Result<(), DistortError> {
        if self.n_resample < 3 {
            return Err(DistortError::InvalidParameter {
                name: "n_resample",
                value: self.n_resample as f64,
            });
        }
        let non_negative = [
            ("jitter_scale", self.jitter_scale),
            ("wobble_amplitude", self.wobble_amplitude),
            ("smooth_sigma", self.smooth_sigma),
            ("phase_range", self.phase_range),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(DistortError::InvalidParameter { name, value });
            }
        }
        if !self.noise_period.is_finite() || self.noise_period <= 0.0 {
            return Err(DistortError::InvalidParameter {
                name: "noise_period",
                value: self.noise_period,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        for style in SketchStyle::all() {
            assert!(style.params().validate().is_ok(), "{style} invalid");
        }
    }

    #[test]
    fn test_style_names_match_config_and_logs() {
        for style in SketchStyle::all() {
            let json = serde_json::to_string(style).unwrap();
            assert_eq!(json, format!("\"{style}\""));
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let params = DistortParams {
            n_resample: 2,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(DistortError::InvalidParameter { name: "n_resample", .. })
        ));

        let params = DistortParams {
            jitter_scale: -0.1,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = DistortParams {
            noise_period: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: DistortParams = serde_json::from_str(r#"{"jitter_scale": 0.02}"#).unwrap();
        assert_eq!(params.jitter_scale, 0.02);
        assert_eq!(params.n_resample, 50);
        assert_eq!(params.smooth_sigma, 0.8);
    }
}
