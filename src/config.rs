//! Run configuration.
//!
//! A `PipelineConfig` can come from a JSON file, the command line, or both
//! (flags win). Tile size and bounds are converted into a zoom level and a
//! tile range exactly once, by `TilingPlan::resolve`.

use std::fs;
use std::path::Path;

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

use crate::distort::{DistortParams, SketchStyle};
use crate::error::ConfigError;
use crate::pipeline::ProcessOptions;
use crate::seeds::RunSeeds;
use crate::tiling::{bbox_to_tile_range, km_to_zoom, GeoBBox, TileRange};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Requested tile side length at the equator
    pub tile_size_km: f64,
    /// Area to tile; the data extent when absent
    pub bounds: Option<GeoBBox>,
    /// Master seed; random when absent
    pub seed: Option<u64>,
    /// Run the hand-drawn sketch stage on every variant
    pub sketch: bool,
    pub style: SketchStyle,
    /// Explicit sketch parameters, overriding `style`
    pub distort: Option<DistortParams>,
    /// Fit every output tile into `0..extent` on both axes
    pub normalize_extent: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tile_size_km: 1.0,
            bounds: None,
            seed: None,
            sketch: false,
            style: SketchStyle::default(),
            distort: None,
            normalize_extent: None,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parameters for the sketch stage: explicit ones, else the style preset.
    pub fn distort_params(&self) -> DistortParams {
        self.distort.clone().unwrap_or_else(|| self.style.params())
    }

    /// Per-tile processing options, validated.
    pub fn process_options(&self) -> Result<ProcessOptions, ConfigError> {
        let sketch = if self.sketch {
            let params = self.distort_params();
            params.validate()?;
            Some(params)
        } else {
            None
        };

        let normalize = match self.normalize_extent {
            Some(extent) if extent.is_finite() && extent > 0.0 => Some(Rect::new(
                coord! { x: 0.0, y: 0.0 },
                coord! { x: extent, y: extent },
            )),
            Some(extent) => return Err(ConfigError::InvalidExtent(extent)),
            None => None,
        };

        let seeds = self.seed.map(RunSeeds::from_master).unwrap_or_default();

        Ok(ProcessOptions {
            sketch,
            seeds,
            normalize,
        })
    }
}

/// Parse `lon,lat,lon,lat` into a box. The corners may come in any order.
pub fn parse_bounds(text: &str) -> Result<GeoBBox, ConfigError> {
    let values: Vec<f64> = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| ConfigError::MalformedBounds(text.to_string()))?;

    let [lon_a, lat_a, lon_b, lat_b] = values[..] else {
        return Err(ConfigError::MalformedBounds(text.to_string()));
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::MalformedBounds(text.to_string()));
    }

    let bbox = GeoBBox::from_corners(lon_a, lat_a, lon_b, lat_b);
    check_bounds(&bbox)?;
    Ok(bbox)
}

fn check_bounds(bbox: &GeoBBox) -> Result<(), ConfigError> {
    if bbox.is_degenerate() {
        return Err(ConfigError::DegenerateBounds {
            west: bbox.west,
            south: bbox.south,
            east: bbox.east,
            north: bbox.north,
        });
    }
    Ok(())
}

/// Zoom level and tile range of a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TilingPlan {
    pub zoom: u8,
    pub range: TileRange,
}

impl TilingPlan {
    /// Resolve the configured tile size and bounds.
    ///
    /// Configured bounds must have area. Without them the plan covers
    /// `extent` (usually the data extent), and the whole world when that is
    /// unknown too.
    pub fn resolve(config: &PipelineConfig, extent: Option<GeoBBox>) -> Result<Self, ConfigError> {
        let zoom = km_to_zoom(config.tile_size_km)?;

        if let Some(bounds) = &config.bounds {
            check_bounds(bounds)?;
        }
        let range = match config.bounds.or(extent) {
            Some(bbox) => bbox_to_tile_range(&bbox, zoom)?,
            None => TileRange::full(zoom)?,
        };

        Ok(Self { zoom, range })
    }
}
