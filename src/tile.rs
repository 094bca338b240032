//! Tiles and the map objects they carry.

use std::collections::BTreeMap;

use geo::Geometry;

use crate::tiling::TileCoord;

/// String-keyed object tags, ordered for stable output
pub type Tags = BTreeMap<String, String>;

/// Tag key that marks an object as a building
pub const BUILDING_TAG: &str = "building";

/// A map object. Only `geom` ever changes as it moves through the
/// pipeline; `id` and `tags` are carried along untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct OsmObject {
    pub id: String,
    pub tags: Tags,
    pub geom: Geometry<f64>,
}

impl OsmObject {
    pub fn new(id: impl Into<String>, tags: Tags, geom: Geometry<f64>) -> Self {
        Self {
            id: id.into(),
            tags,
            geom,
        }
    }

    /// Same identity and tags, different geometry.
    pub fn with_geom(&self, geom: Geometry<f64>) -> Self {
        Self {
            id: self.id.clone(),
            tags: self.tags.clone(),
            geom,
        }
    }

    pub fn is_building(&self) -> bool {
        self.tags.contains_key(BUILDING_TAG)
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self.geom, Geometry::Polygon(_))
    }
}

/// The objects of one tile, in source order.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub coord: TileCoord,
    /// Index into the augmentation family; `None` for a source tile
    pub variant: Option<usize>,
    pub objects: Vec<OsmObject>,
}

impl Tile {
    pub fn new(coord: TileCoord, objects: Vec<OsmObject>) -> Self {
        Self {
            coord,
            variant: None,
            objects,
        }
    }

    /// A tile at the same coordinate whose object `i` is this tile's object
    /// `i` with geometry `geoms[i]`.
    ///
    /// The caller guarantees `geoms.len() == self.objects.len()`.
    pub(crate) fn rebuild(&self, variant: Option<usize>, geoms: Vec<Geometry<f64>>) -> Tile {
        debug_assert_eq!(geoms.len(), self.objects.len());
        Tile {
            coord: self.coord,
            variant,
            objects: self
                .objects
                .iter()
                .zip(geoms)
                .map(|(object, geom)| object.with_geom(geom))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_building_and_polygon_checks() {
        let house = OsmObject::new(
            "w1",
            tags(&[("building", "yes")]),
            Geometry::Polygon(polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)]),
        );
        assert!(house.is_building());
        assert!(house.is_polygon());

        let tree = OsmObject::new(
            "n2",
            tags(&[("natural", "tree")]),
            Geometry::Point(point!(x: 0.0, y: 0.0)),
        );
        assert!(!tree.is_building());
        assert!(!tree.is_polygon());
    }

    #[test]
    fn test_rebuild_keeps_identity() {
        let coord = TileCoord::new(1, 2, 3).unwrap();
        let tile = Tile::new(
            coord,
            vec![
                OsmObject::new(
                    "a",
                    tags(&[("building", "yes")]),
                    Geometry::Point(point!(x: 0.0, y: 0.0)),
                ),
                OsmObject::new(
                    "b",
                    tags(&[("building", "house")]),
                    Geometry::Point(point!(x: 1.0, y: 1.0)),
                ),
            ],
        );
        let moved = tile.rebuild(
            Some(4),
            vec![
                Geometry::Point(point!(x: 10.0, y: 0.0)),
                Geometry::Point(point!(x: 11.0, y: 1.0)),
            ],
        );

        assert_eq!(moved.coord, coord);
        assert_eq!(moved.variant, Some(4));
        assert_eq!(moved.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(moved.objects[1].tags, tile.objects[1].tags);
        assert_eq!(moved.objects[0].geom, Geometry::Point(point!(x: 10.0, y: 0.0)));
    }
}
