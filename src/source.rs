//! Object sources: where tiles get their objects from.
//!
//! A source answers one spatial query per tile. `tile_stream` walks a tile
//! range lazily and turns each answer into a `Tile`, so only one tile's
//! objects are held at a time.

use std::fs;
use std::path::Path;

use geo::{BoundingRect, GeometryCollection, Intersects, Rect};
use tracing::{debug, info};

use crate::error::SourceError;
use crate::geojson::FeatureCollection;
use crate::tile::{OsmObject, Tile};
use crate::tiling::{tile_envelope_wkt, tile_to_bbox, GeoBBox, TileCoord, TileRange};

/// Spatial query for the objects of one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TileQuery {
    pub coord: TileCoord,
    pub bbox: GeoBBox,
    /// Tile envelope as a WKT polygon, for sources backed by a spatial
    /// database
    pub envelope_wkt: String,
}

impl TileQuery {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            bbox: tile_to_bbox(&coord),
            envelope_wkt: tile_envelope_wkt(&coord),
        }
    }
}

/// Supplies the objects intersecting a tile envelope.
pub trait ObjectSource {
    fn fetch(&self, query: &TileQuery) -> Result<Vec<OsmObject>, SourceError>;

    /// Bounding box of everything the source holds, if known.
    fn extent(&self) -> Option<GeoBBox> {
        None
    }
}

/// Lazily query `source` for every tile in `range`, `x` outer and `y` inner.
///
/// A failed query yields an `Err` for that tile only; iteration continues.
pub fn tile_stream<'a, S>(
    source: &'a S,
    range: TileRange,
) -> impl Iterator<Item = Result<Tile, SourceError>> + 'a
where
    S: ObjectSource + ?Sized,
{
    range.iter().map(move |coord| {
        let query = TileQuery::new(coord);
        let objects = source.fetch(&query)?;
        debug!(tile = %coord, objects = objects.len(), "fetched tile");
        Ok(Tile::new(coord, objects))
    })
}

/// In-memory source over a GeoJSON feature collection.
///
/// Objects are matched to tiles by bounding-box overlap, so an object
/// straddling a tile edge appears in every tile it touches.
#[derive(Clone, Debug, Default)]
pub struct GeoJsonSource {
    entries: Vec<(Rect<f64>, OsmObject)>,
}

impl GeoJsonSource {
    /// Objects without coordinates are dropped, since they cannot be
    /// located in any tile.
    pub fn new(objects: Vec<OsmObject>) -> Self {
        let entries = objects
            .into_iter()
            .filter_map(|object| object.geom.bounding_rect().map(|rect| (rect, object)))
            .collect();
        Self { entries }
    }

    pub fn from_collection(collection: &FeatureCollection) -> Self {
        Self::new(collection.to_objects())
    }

    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let collection: FeatureCollection =
            serde_json::from_str(&text).map_err(|source| SourceError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let loaded = Self::from_collection(&collection);
        info!(
            path = %path.display(),
            features = collection.features.len(),
            objects = loaded.len(),
            "loaded GeoJSON source"
        );
        Ok(loaded)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ObjectSource for GeoJsonSource {
    fn fetch(&self, query: &TileQuery) -> Result<Vec<OsmObject>, SourceError> {
        let envelope = query.bbox.to_rect();
        Ok(self
            .entries
            .iter()
            .filter(|(rect, _)| rect.intersects(&envelope))
            .map(|(_, object)| object.clone())
            .collect())
    }

    fn extent(&self) -> Option<GeoBBox> {
        self.entries
            .iter()
            .map(|(rect, _)| *rect)
            .collect::<GeometryCollection<f64>>()
            .bounding_rect()
            .map(GeoBBox::from_rect)
    }
}
