//! Web Mercator tile addressing.
//!
//! Conversions between geographic coordinates (decimal degrees) and the
//! standard slippy-map quadtree: origin at the top-left, `2^zoom` tiles per
//! axis, `y` growing southwards.

use std::f64::consts::PI;
use std::fmt;

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TilingError};

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Highest zoom level the grid addresses (tile indices stay within `u32`)
pub const MAX_ZOOM: u8 = 24;

/// WGS84 equatorial radius in meters
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Pixel size of one tile in the resolution formula
pub const TILE_PIXELS: f64 = 256.0;

// =============================================================================
// TYPES
// =============================================================================

/// A tile in the Web Mercator quadtree.
///
/// Always inside the grid of its zoom level: the only ways to get one are
/// `TileCoord::new`, deserialization (which goes through `new`) and the
/// grid helpers in this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTileCoord")]
pub struct TileCoord {
    /// Column, 0 at the antimeridian going east
    x: u32,
    /// Row, 0 at the north edge going south
    y: u32,
    zoom: u8,
}

#[derive(Deserialize)]
struct RawTileCoord {
    x: u32,
    y: u32,
    zoom: u8,
}

impl TryFrom<RawTileCoord> for TileCoord {
    type Error = TilingError;

    fn try_from(raw: RawTileCoord) -> Result<Self, Self::Error> {
        Self::new(raw.x, raw.y, raw.zoom)
    }
}

impl TileCoord {
    /// Create a tile coordinate, rejecting indices outside the grid.
    pub fn new(x: u32, y: u32, zoom: u8) -> Result<Self, TilingError> {
        let size = tiles_per_axis(zoom)?;
        if u64::from(x) >= size || u64::from(y) >= size {
            return Err(TilingError::OutOfGrid { x, y, zoom, size });
        }
        Ok(Self { x, y, zoom })
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBBox {
    /// Create a box, clamping latitudes into the Mercator-valid range.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south: south.clamp(MIN_LAT, MAX_LAT),
            east,
            north: north.clamp(MIN_LAT, MAX_LAT),
        }
    }

    /// Build from two arbitrary corners `(lon, lat, lon, lat)`.
    pub fn from_corners(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> Self {
        Self::new(
            lon_a.min(lon_b),
            lat_a.min(lat_b),
            lon_a.max(lon_b),
            lat_a.max(lat_b),
        )
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Closed containment test (boundary counts as inside).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    /// True when the box has no area
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// Inclusive range of tile indices at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
    pub zoom: u8,
}

impl TileRange {
    /// Every tile of the grid.
    pub fn full(zoom: u8) -> Result<Self, TilingError> {
        let last = (tiles_per_axis(zoom)? - 1) as u32;
        Ok(Self {
            x_min: 0,
            x_max: last,
            y_min: 0,
            y_max: last,
            zoom,
        })
    }

    /// Tiles overlapping a geographic box.
    ///
    /// The north-west corner gives the minimum indices and the south-east
    /// corner the maximum ones, since `y` grows southwards. All indices are
    /// clamped into the grid.
    pub fn covering(bbox: &GeoBBox, zoom: u8) -> Result<Self, TilingError> {
        let nw = geo_to_tile(bbox.west, bbox.north, zoom)?;
        let se = geo_to_tile(bbox.east, bbox.south, zoom)?;
        Ok(Self {
            x_min: nw.x.min(se.x),
            x_max: nw.x.max(se.x),
            y_min: nw.y.min(se.y),
            y_max: nw.y.max(se.y),
            zoom,
        })
    }

    /// Number of tiles in the range
    pub fn tile_count(&self) -> u64 {
        u64::from(self.x_max - self.x_min + 1) * u64::from(self.y_max - self.y_min + 1)
    }

    /// Tiles in column-major order: `x` outer, `y` inner.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> {
        let TileRange {
            x_min,
            x_max,
            y_min,
            y_max,
            zoom,
        } = *self;
        (x_min..=x_max).flat_map(move |x| (y_min..=y_max).map(move |y| TileCoord { x, y, zoom }))
    }

    /// Union of the geographic boxes of every tile in the range.
    pub fn bbox(&self) -> GeoBBox {
        let nw = tile_to_bbox(&TileCoord {
            x: self.x_min,
            y: self.y_min,
            zoom: self.zoom,
        });
        let se = tile_to_bbox(&TileCoord {
            x: self.x_max,
            y: self.y_max,
            zoom: self.zoom,
        });
        GeoBBox::new(nw.west, se.south, se.east, nw.north)
    }
}

impl fmt::Display for TileRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "z{} x[{}..={}] y[{}..={}]",
            self.zoom, self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

/// Number of tiles along one axis at `zoom`.
pub fn tiles_per_axis(zoom: u8) -> Result<u64, TilingError> {
    if zoom > MAX_ZOOM {
        return Err(TilingError::InvalidZoom(zoom));
    }
    Ok(1u64 << zoom)
}

/// Meters per pixel at zoom 0 on the equator.
#[inline]
pub fn initial_resolution() -> f64 {
    2.0 * PI * EARTH_RADIUS_M / TILE_PIXELS
}

/// Meters per pixel at `zoom` on the equator.
#[inline]
pub fn resolution(zoom: u8) -> f64 {
    initial_resolution() / 2.0_f64.powi(i32::from(zoom))
}

/// Zoom level whose equatorial tile side is closest to `km` kilometers.
pub fn km_to_zoom(km: f64) -> Result<u8, ConfigError> {
    if !km.is_finite() || km <= 0.0 {
        return Err(ConfigError::InvalidTileSize(km));
    }

    let zoom = (initial_resolution() * TILE_PIXELS / (km * 1000.0))
        .log2()
        .round()
        .max(0.0);

    if zoom > f64::from(MAX_ZOOM) {
        return Err(ConfigError::ZoomOutOfRange {
            km,
            zoom: zoom as u32,
            max: MAX_ZOOM,
        });
    }
    Ok(zoom as u8)
}

/// Geographic bounds of a tile.
pub fn tile_to_bbox(tile: &TileCoord) -> GeoBBox {
    let n = 2.0_f64.powi(i32::from(tile.zoom));

    let west = f64::from(tile.x) / n * 360.0 - 180.0;
    let east = (f64::from(tile.x) + 1.0) / n * 360.0 - 180.0;

    let north = mercator_y_to_lat(f64::from(tile.y) / n);
    let south = mercator_y_to_lat((f64::from(tile.y) + 1.0) / n);

    GeoBBox {
        west,
        south,
        east,
        north,
    }
}

/// Inverse Web Mercator for a normalized `y` in `[0, 1]`.
#[inline]
fn mercator_y_to_lat(y_frac: f64) -> f64 {
    (PI * (1.0 - 2.0 * y_frac)).sinh().atan().to_degrees()
}

/// Tile containing a geographic point.
///
/// Latitude is clamped to the Mercator-valid range before projecting and the
/// resulting indices are clamped into the grid, so `lon = 180` lands in the
/// last column. Each tile owns the half-open interval `[west, east)` by
/// `[north, south)`.
pub fn geo_to_tile(lon: f64, lat: f64, zoom: u8) -> Result<TileCoord, TilingError> {
    let size = tiles_per_axis(zoom)?;
    let n = size as f64;
    let last = (size - 1) as f64;

    let lat_rad = lat.clamp(MIN_LAT, MAX_LAT).to_radians();

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    Ok(TileCoord {
        x: x.clamp(0.0, last) as u32,
        y: y.clamp(0.0, last) as u32,
        zoom,
    })
}

/// Inclusive tile index range overlapping `bbox`.
pub fn bbox_to_tile_range(bbox: &GeoBBox, zoom: u8) -> Result<TileRange, TilingError> {
    TileRange::covering(bbox, zoom)
}

/// Tile bounds as a closed WKT polygon, vertex order SW, SE, NE, NW, SW.
pub fn tile_envelope_wkt(tile: &TileCoord) -> String {
    let b = tile_to_bbox(tile);
    format!(
        "POLYGON(({w} {s}, {e} {s}, {e} {n}, {w} {n}, {w} {s}))",
        w = b.west,
        s = b.south,
        e = b.east,
        n = b.north,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_km_to_zoom() {
        assert_eq!(km_to_zoom(1.0).unwrap(), 15);
        assert_eq!(km_to_zoom(10.0).unwrap(), 12);
        // Whole equator in one tile
        assert_eq!(km_to_zoom(40_075.0).unwrap(), 0);
        // Larger than the world clamps to zoom 0
        assert_eq!(km_to_zoom(200_000.0).unwrap(), 0);
    }

    #[test]
    fn test_km_to_zoom_rejects_bad_sizes() {
        assert!(matches!(km_to_zoom(0.0), Err(ConfigError::InvalidTileSize(_))));
        assert!(matches!(km_to_zoom(-3.0), Err(ConfigError::InvalidTileSize(_))));
        assert!(matches!(km_to_zoom(f64::NAN), Err(ConfigError::InvalidTileSize(_))));
        assert!(matches!(
            km_to_zoom(0.0001),
            Err(ConfigError::ZoomOutOfRange { .. })
        ));
    }

    #[test]
    fn test_resolution_halves_per_zoom() {
        assert!((resolution(0) - 156_543.033_928).abs() < 0.001);
        assert!((resolution(1) * 2.0 - resolution(0)).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_zero_is_whole_world() {
        let tile = TileCoord::new(0, 0, 0).unwrap();
        let b = tile_to_bbox(&tile);
        assert!((b.west + 180.0).abs() < 1e-9);
        assert!((b.east - 180.0).abs() < 1e-9);
        assert!((b.north - MAX_LAT).abs() < 1e-6);
        assert!((b.south - MIN_LAT).abs() < 1e-6);

        assert_eq!(geo_to_tile(8.5, 47.3, 0).unwrap(), tile);
        assert_eq!(geo_to_tile(-179.0, -80.0, 0).unwrap(), tile);
    }

    #[test]
    fn test_known_tile() {
        // New York City at zoom 16
        let tile = geo_to_tile(-74.0060, 40.7128, 16).unwrap();
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.y, 24640);
    }

    #[test]
    fn test_round_trip_contains_point() {
        let points = [
            (8.5417, 47.3769),
            (-74.0060, 40.7128),
            (151.2093, -33.8688),
            (0.0, 0.0),
            (-179.999, 85.0),
            (179.999, -85.0),
        ];
        for zoom in [0u8, 3, 10, 14, 18] {
            for &(lon, lat) in &points {
                let tile = geo_to_tile(lon, lat, zoom).unwrap();
                let b = tile_to_bbox(&tile);
                assert!(
                    b.contains(lon, lat),
                    "({lon}, {lat}) not inside {b:?} at {tile}"
                );
            }
        }
    }

    #[test]
    fn test_boundary_belongs_to_east_and_south_tile() {
        // Prime meridian and equator are tile edges at zoom 1
        let tile = geo_to_tile(0.0, 0.0, 1).unwrap();
        assert_eq!((tile.x, tile.y), (1, 1));
        let tile = geo_to_tile(-180.0, 10.0, 1).unwrap();
        assert_eq!((tile.x, tile.y), (0, 0));
    }

    #[test]
    fn test_latitude_clamped_before_projection() {
        let north = geo_to_tile(10.0, 89.9, 5).unwrap();
        assert_eq!(north.y, 0);
        let south = geo_to_tile(10.0, -89.9, 5).unwrap();
        assert_eq!(south.y, 31);
        let east = geo_to_tile(180.0, 0.0, 5).unwrap();
        assert_eq!(east.x, 31);
    }

    #[test]
    fn test_tile_range_covers_box() {
        let bbox = GeoBBox::new(8.0, 47.0, 9.0, 48.0);
        let range = bbox_to_tile_range(&bbox, 10).unwrap();

        assert!(range.x_min <= range.x_max);
        assert!(range.y_min <= range.y_max);

        let covered = range.bbox();
        assert!(covered.west <= bbox.west && covered.east >= bbox.east);
        assert!(covered.south <= bbox.south && covered.north >= bbox.north);

        // At most one tile of padding on each side
        let tile_w = 360.0 / 1024.0;
        assert!(bbox.west - covered.west < tile_w);
        assert!(covered.east - bbox.east < tile_w);

        // Tile height varies with latitude, so compare against the edge rows
        let top = tile_to_bbox(&TileCoord::new(range.x_min, range.y_min, 10).unwrap());
        let bottom = tile_to_bbox(&TileCoord::new(range.x_max, range.y_max, 10).unwrap());
        assert!(covered.north - bbox.north < top.height());
        assert!(bbox.south - covered.south < bottom.height());
    }

    #[test]
    fn test_tile_range_clamps_to_grid() {
        let bbox = GeoBBox::new(-200.0, -90.0, 200.0, 90.0);
        let range = bbox_to_tile_range(&bbox, 3).unwrap();
        assert_eq!(range, TileRange::full(3).unwrap());
        assert_eq!(range.tile_count(), 64);
    }

    #[test]
    fn test_tile_range_iteration_order() {
        let range = TileRange {
            x_min: 2,
            x_max: 3,
            y_min: 5,
            y_max: 6,
            zoom: 4,
        };
        let tiles: Vec<(u32, u32)> = range.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(tiles, vec![(2, 5), (2, 6), (3, 5), (3, 6)]);
        assert_eq!(range.tile_count(), 4);
    }

    #[test]
    fn test_envelope_wkt() {
        let tile = TileCoord::new(0, 0, 1).unwrap();
        let wkt = tile_envelope_wkt(&tile);
        assert!(wkt.starts_with("POLYGON((-180 0, 0 0, 0 "));
        assert!(wkt.ends_with(", -180 0))"));
        // Five vertices, first equals last
        let inner = wkt.trim_start_matches("POLYGON((").trim_end_matches("))");
        let vertices: Vec<&str> = inner.split(", ").collect();
        assert_eq!(vertices.len(), 5);
        assert_eq!(vertices[0], vertices[4]);
    }

    #[test]
    fn test_tile_coord_validation() {
        assert!(TileCoord::new(3, 3, 2).is_ok());
        assert!(matches!(
            TileCoord::new(4, 0, 2),
            Err(TilingError::OutOfGrid { .. })
        ));
        assert!(matches!(
            TileCoord::new(0, 0, MAX_ZOOM + 1),
            Err(TilingError::InvalidZoom(_))
        ));
    }

    #[test]
    fn test_tile_coord_deserialize_validates() {
        let coord: TileCoord = serde_json::from_str(r#"{"x": 3, "y": 1, "zoom": 2}"#).unwrap();
        assert_eq!((coord.x(), coord.y(), coord.zoom()), (3, 1, 2));

        assert!(serde_json::from_str::<TileCoord>(r#"{"x": 4, "y": 0, "zoom": 2}"#).is_err());
        let huge = r#"{"x": 4294967295, "y": 0, "zoom": 24}"#;
        assert!(serde_json::from_str::<TileCoord>(huge).is_err());

        let json = serde_json::to_string(&coord).unwrap();
        assert_eq!(serde_json::from_str::<TileCoord>(&json).unwrap(), coord);
    }

    #[test]
    fn test_geo_bbox_clamps_latitude() {
        let b = GeoBBox::new(0.0, -90.0, 1.0, 90.0);
        assert_eq!(b.south, MIN_LAT);
        assert_eq!(b.north, MAX_LAT);
        let c = GeoBBox::from_corners(9.0, 48.0, 8.0, 47.0);
        assert_eq!((c.west, c.south, c.east, c.north), (8.0, 47.0, 9.0, 48.0));
    }
}
