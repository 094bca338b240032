//! GeoJSON encoding of objects and tiles.
//!
//! A small serde model of the parts of RFC 7946 the pipeline reads and
//! writes: features with an id, string-valued properties and a geometry.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tile::{OsmObject, Tags, Tile};

/// `[lon, lat]`, optionally followed by an altitude that is ignored
pub type Position = Vec<f64>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<GeoJsonGeometry> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    pub geometry: Option<GeoJsonGeometry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

// =============================================================================
// GEOMETRY CONVERSION
// =============================================================================

fn to_coord(position: &Position) -> Option<Coord<f64>> {
    match position.as_slice() {
        [x, y, ..] => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

fn to_line(positions: &[Position]) -> Option<LineString<f64>> {
    positions
        .iter()
        .map(to_coord)
        .collect::<Option<Vec<_>>>()
        .map(LineString::new)
}

fn to_polygon(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| to_line(r));
    let exterior = rings.next().flatten()?;
    let interiors = rings.collect::<Option<Vec<_>>>()?;
    Some(Polygon::new(exterior, interiors))
}

/// Convert to a `geo` geometry; `None` if any position is malformed.
pub fn to_geo(geometry: &GeoJsonGeometry) -> Option<Geometry<f64>> {
    Some(match geometry {
        GeoJsonGeometry::Point { coordinates } => Geometry::Point(Point(to_coord(coordinates)?)),
        GeoJsonGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint::new(
            coordinates
                .iter()
                .map(|p| to_coord(p).map(Point))
                .collect::<Option<_>>()?,
        )),
        GeoJsonGeometry::LineString { coordinates } => Geometry::LineString(to_line(coordinates)?),
        GeoJsonGeometry::MultiLineString { coordinates } => Geometry::MultiLineString(
            MultiLineString::new(coordinates.iter().map(|l| to_line(l)).collect::<Option<_>>()?),
        ),
        GeoJsonGeometry::Polygon { coordinates } => Geometry::Polygon(to_polygon(coordinates)?),
        GeoJsonGeometry::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon::new(
            coordinates.iter().map(|p| to_polygon(p)).collect::<Option<_>>()?,
        )),
        GeoJsonGeometry::GeometryCollection { geometries } => Geometry::GeometryCollection(
            GeometryCollection::new_from(geometries.iter().map(to_geo).collect::<Option<_>>()?),
        ),
    })
}

fn from_coord(c: &Coord<f64>) -> Position {
    vec![c.x, c.y]
}

fn from_line(line: &LineString<f64>) -> Vec<Position> {
    line.0.iter().map(from_coord).collect()
}

fn from_polygon(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(from_line)
        .collect()
}

/// Convert from a `geo` geometry. Lines, rectangles and triangles are
/// written as their LineString/Polygon equivalents.
pub fn from_geo(geometry: &Geometry<f64>) -> GeoJsonGeometry {
    match geometry {
        Geometry::Point(p) => GeoJsonGeometry::Point {
            coordinates: from_coord(&p.0),
        },
        Geometry::Line(l) => GeoJsonGeometry::LineString {
            coordinates: vec![from_coord(&l.start), from_coord(&l.end)],
        },
        Geometry::LineString(l) => GeoJsonGeometry::LineString {
            coordinates: from_line(l),
        },
        Geometry::Polygon(p) => GeoJsonGeometry::Polygon {
            coordinates: from_polygon(p),
        },
        Geometry::MultiPoint(mp) => GeoJsonGeometry::MultiPoint {
            coordinates: mp.0.iter().map(|p| from_coord(&p.0)).collect(),
        },
        Geometry::MultiLineString(ml) => GeoJsonGeometry::MultiLineString {
            coordinates: ml.0.iter().map(from_line).collect(),
        },
        Geometry::MultiPolygon(mp) => GeoJsonGeometry::MultiPolygon {
            coordinates: mp.0.iter().map(from_polygon).collect(),
        },
        Geometry::GeometryCollection(gc) => GeoJsonGeometry::GeometryCollection {
            geometries: gc.0.iter().map(from_geo).collect(),
        },
        Geometry::Rect(r) => GeoJsonGeometry::Polygon {
            coordinates: from_polygon(&r.to_polygon()),
        },
        Geometry::Triangle(t) => GeoJsonGeometry::Polygon {
            coordinates: from_polygon(&t.to_polygon()),
        },
    }
}

// =============================================================================
// FEATURES
// =============================================================================

fn value_to_tag(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl Feature {
    /// Convert to an object. The id comes from the feature `id`, then a
    /// `properties.id`, then `fallback_id`. Features without a usable
    /// geometry are dropped.
    pub fn to_object(&self, fallback_id: impl FnOnce() -> String) -> Option<OsmObject> {
        let geom = to_geo(self.geometry.as_ref()?)?;

        let tags: Tags = self
            .properties
            .iter()
            .flatten()
            .filter_map(|(k, v)| value_to_tag(v).map(|v| (k.clone(), v)))
            .collect();

        let id = self
            .id
            .as_ref()
            .and_then(value_to_tag)
            .or_else(|| tags.get("id").cloned())
            .unwrap_or_else(fallback_id);

        Some(OsmObject::new(id, tags, geom))
    }

    pub fn from_object(object: &OsmObject) -> Self {
        Self {
            kind: "Feature".to_string(),
            id: Some(Value::String(object.id.clone())),
            properties: Some(
                object
                    .tags
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            geometry: Some(from_geo(&object.geom)),
        }
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }

    /// Objects of a tile as features, in tile order.
    pub fn from_tile(tile: &Tile) -> Self {
        Self::new(tile.objects.iter().map(Feature::from_object).collect())
    }

    /// Decode every feature that carries a geometry.
    pub fn to_objects(&self) -> Vec<OsmObject> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.to_object(|| format!("feature/{i}")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiling::TileCoord;
    use geo::polygon;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": 4711,
                "properties": {"building": "yes", "levels": 3, "name": null},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[8.0, 47.0], [8.1, 47.0], [8.1, 47.1], [8.0, 47.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"id": "way/12", "highway": "residential"},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[8.0, 47.0, 410.0], [8.2, 47.2, 415.0]]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": null
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [8.3, 47.3]}
            }
        ]
    }"#;

    #[test]
    fn test_decode_features() {
        let collection: FeatureCollection = serde_json::from_str(SAMPLE).unwrap();
        let objects = collection.to_objects();
        assert_eq!(objects.len(), 3);

        assert_eq!(objects[0].id, "4711");
        assert_eq!(objects[0].tags.get("building").map(String::as_str), Some("yes"));
        assert_eq!(objects[0].tags.get("levels").map(String::as_str), Some("3"));
        assert!(!objects[0].tags.contains_key("name"));
        assert!(objects[0].is_polygon());

        // Altitude dropped, id taken from properties
        assert_eq!(objects[1].id, "way/12");
        assert!(matches!(objects[1].geom, Geometry::LineString(ref l) if l.0.len() == 2));

        // No id anywhere: falls back to the feature index
        assert_eq!(objects[2].id, "feature/3");
    }

    #[test]
    fn test_malformed_position_is_dropped() {
        let feature: Feature = serde_json::from_str(
            r#"{"type": "Feature", "properties": {},
                "geometry": {"type": "Point", "coordinates": [8.0]}}"#,
        )
        .unwrap();
        assert!(feature.to_object(|| "x".to_string()).is_none());
    }

    #[test]
    fn test_encode_tile() {
        let mut tags = Tags::new();
        tags.insert("building".to_string(), "house".to_string());
        let tile = Tile::new(
            TileCoord::new(1, 1, 2).unwrap(),
            vec![OsmObject::new(
                "way/1",
                tags,
                Geometry::Polygon(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)]),
            )],
        );

        let json = serde_json::to_value(FeatureCollection::from_tile(&tile)).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["id"], "way/1");
        assert_eq!(json["features"][0]["properties"]["building"], "house");
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
        // Ring closed by geo
        assert_eq!(
            json["features"][0]["geometry"]["coordinates"][0]
                .as_array()
                .map(Vec::len),
            Some(4)
        );
    }

    #[test]
    fn test_collection_geometry_nests() {
        let geom = Geometry::GeometryCollection(GeometryCollection::new_from(vec![
            Geometry::Point(Point::new(1.0, 2.0)),
        ]));
        let encoded = from_geo(&geom);
        assert_eq!(to_geo(&encoded), Some(geom));
    }
}
