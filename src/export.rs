//! Writes tiles to disk as GeoJSON, one file per tile or variant.
//!
//! Layout: `<root>/<zoom>/<x>_<y>.geojson` for a source tile and
//! `<root>/<zoom>/<x>_<y>_v<index>.geojson` for variant `index`.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::ExportError;
use crate::geojson::FeatureCollection;
use crate::tile::Tile;

#[derive(Clone, Debug)]
pub struct TileWriter {
    root: PathBuf,
}

impl TileWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output path of a tile, without touching the filesystem.
    pub fn path_for(&self, tile: &Tile) -> PathBuf {
        let c = tile.coord;
        let name = match tile.variant {
            Some(index) => format!("{}_{}_v{}.geojson", c.x(), c.y(), index),
            None => format!("{}_{}.geojson", c.x(), c.y()),
        };
        self.root.join(c.zoom().to_string()).join(name)
    }

    /// Encode and write one tile, creating the zoom directory if needed.
    pub fn write(&self, tile: &Tile) -> Result<PathBuf, ExportError> {
        let path = self.path_for(tile);
        let bytes = serde_json::to_vec(&FeatureCollection::from_tile(tile)).map_err(|source| {
            ExportError::Encode {
                tile: tile.coord,
                source,
            }
        })?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ExportError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), objects = tile.len(), "wrote tile");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{OsmObject, Tags};
    use crate::tiling::TileCoord;
    use geo::{polygon, Geometry};

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tile_sketch_export_{}_{}", name, std::process::id()))
    }

    fn sample_tile() -> Tile {
        let mut tags = Tags::new();
        tags.insert("building".to_string(), "yes".to_string());
        Tile::new(
            TileCoord::new(3, 5, 4).unwrap(),
            vec![OsmObject::new(
                "way/7",
                tags,
                Geometry::Polygon(polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0)]),
            )],
        )
    }

    #[test]
    fn test_paths() {
        let writer = TileWriter::new("/out");
        let mut tile = sample_tile();
        assert_eq!(writer.path_for(&tile), PathBuf::from("/out/4/3_5.geojson"));
        tile.variant = Some(12);
        assert_eq!(writer.path_for(&tile), PathBuf::from("/out/4/3_5_v12.geojson"));
    }

    #[test]
    fn test_write_round_trips_ids_and_tags() {
        let root = scratch("write");
        let writer = TileWriter::new(&root);
        let tile = sample_tile();

        let path = writer.write(&tile).unwrap();
        assert!(path.starts_with(&root));

        let text = fs::read_to_string(&path).unwrap();
        let collection: FeatureCollection = serde_json::from_str(&text).unwrap();
        let objects = collection.to_objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].id, "way/7");
        assert_eq!(objects[0].tags, tile.objects[0].tags);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_write_fails_when_root_is_a_file() {
        let root = scratch("blocked");
        fs::write(&root, "occupied").unwrap();

        let result = TileWriter::new(&root).write(&sample_tile());
        assert!(matches!(result, Err(ExportError::Io { .. })));

        fs::remove_file(&root).unwrap();
    }
}
