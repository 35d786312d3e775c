//! Density-driven quadtree tiling.
//!
//! Top-down recursion: count the features in a tile's box, stop on empty
//! tiles, realize content when the count fits, otherwise split into four
//! quadrants one level deeper. Sibling quadrants run fork-join in
//! parallel; every call returns an owned subtree that the parent
//! assembles after all four children resolve.

use std::path::PathBuf;

use glam::DVec3;
use log::{debug, warn};
use rayon::prelude::*;

use tilemesh::{
    encode_tile, triangles_for, EncodeOptions, GeometryRecord, MeshError, ProcessorConfig,
    TileFormat, Triangle, TubeParams,
};

use crate::bbox::BoundingBox;
use crate::error::TreeError;
use crate::source::GeometrySource;
use crate::tile::{Tile, TileId};

#[derive(Debug, Clone)]
pub struct TilerConfig {
    /// A tile whose feature count is at or below this becomes a leaf.
    pub max_features_per_tile: u64,
    /// Detail-level values, coarse to fine; the level index advances
    /// with recursion depth. Empty means the source has no levels.
    pub lod_levels: Vec<i64>,
    /// Hard recursion stop; tiles at this depth are accepted regardless
    /// of their feature count.
    pub max_depth: u32,
    pub format: TileFormat,
    pub encode: EncodeOptions,
    pub tube: TubeParams,
    /// Subtracted from every vertex to get tile-local coordinates.
    pub translation: DVec3,
    /// Directory receiving one content file per available tile.
    pub content_dir: PathBuf,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            max_features_per_tile: 1000,
            lod_levels: Vec::new(),
            max_depth: 24,
            format: TileFormat::Glb,
            encode: EncodeOptions::default(),
            tube: TubeParams::default(),
            translation: DVec3::ZERO,
            content_dir: PathBuf::from("content"),
        }
    }
}

impl TilerConfig {
    fn lod_for_depth(&self, z: u32) -> Option<i64> {
        if self.lod_levels.is_empty() {
            return None;
        }
        let idx = (z as usize).min(self.lod_levels.len() - 1);
        Some(self.lod_levels[idx])
    }

    /// Recursion also stops at the finest configured detail level.
    fn at_deepest_level(&self, z: u32) -> bool {
        !self.lod_levels.is_empty() && z as usize + 1 >= self.lod_levels.len()
    }
}

/// Generate the full tile tree, writing one content file per accepted
/// tile. Unavailable placeholder nodes stay in the returned tree for
/// bounding-volume and availability bookkeeping.
pub fn generate_tiles<S: GeometrySource>(
    source: &S,
    root_bbox: BoundingBox,
    cfg: &TilerConfig,
) -> Result<Tile, TreeError> {
    build_subtree(source, cfg, TileId::ROOT, root_bbox)
}

fn build_subtree<S: GeometrySource>(
    source: &S,
    cfg: &TilerConfig,
    id: TileId,
    bbox: BoundingBox,
) -> Result<Tile, TreeError> {
    let lod = cfg.lod_for_depth(id.z);
    let count = source.feature_count(&bbox, lod)?;

    if count == 0 {
        return Ok(Tile::unavailable(id, bbox));
    }

    if count <= cfg.max_features_per_tile || id.z >= cfg.max_depth || cfg.at_deepest_level(id.z) {
        if count > cfg.max_features_per_tile {
            warn!("tile {id}: accepting {count} features above the split threshold");
        }
        return realize_leaf(source, cfg, id, bbox, lod);
    }

    debug!("tile {id}: {count} features, splitting");

    let children: Vec<Result<Tile, TreeError>> = id
        .children()
        .into_iter()
        .zip(bbox.split())
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(child_id, child_bbox)| build_subtree(source, cfg, child_id, child_bbox))
        .collect();

    let mut tile = Tile::unavailable(id, bbox);
    tile.children = children.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(tile)
}

fn realize_leaf<S: GeometrySource>(
    source: &S,
    cfg: &TilerConfig,
    id: TileId,
    bbox: BoundingBox,
    lod: Option<i64>,
) -> Result<Tile, TreeError> {
    let set = source.load_features(&bbox, lod)?;

    let processor = ProcessorConfig {
        translation: cfg.translation,
        scale: None,
        tube: cfg.tube,
    };

    // One batch per feature, ids renumbered tile-locally so batch ids
    // index the attribute rows. A feature that fails to triangulate
    // keeps its (empty) batch slot so rows stay aligned.
    let mut batches: Vec<Vec<Triangle>> = Vec::with_capacity(set.records.len());
    for (i, record) in set.records.iter().enumerate() {
        let local = GeometryRecord {
            batch_id: i as u32,
            ..record.clone()
        };
        match triangles_for(&local, &processor) {
            Ok(triangles) => batches.push(triangles),
            Err(err @ (MeshError::UnsupportedGeometry(_) | MeshError::DegenerateRing(_))) => {
                warn!("tile {id}: skipping feature {i}: {err}");
                batches.push(Vec::new());
            }
            // Shader/attribute contract violations are programming or
            // configuration errors, not recoverable data errors.
            Err(err) => return Err(err.into()),
        }
    }

    let attributes = (!set.attributes.is_empty()).then_some(&set.attributes);
    let mut tile = Tile::unavailable(id, bbox);

    match encode_tile(&batches, attributes, cfg.format, &cfg.encode)? {
        Some(bytes) => {
            let name = format!("{id}.{}", cfg.format.extension());
            std::fs::write(cfg.content_dir.join(&name), bytes)?;
            tile.available = true;
            tile.content = Some(name);
        }
        None => {
            // Everything degenerated; demote instead of pointing at
            // empty content.
            debug!("tile {id}: no surviving triangles, demoted to unavailable");
        }
    }

    Ok(tile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FeatureSet;
    use tilemesh::{Geometry, Polygon};

    /// In-memory source: point-sized features, each expanded into a
    /// small square polygon on load.
    struct MemorySource {
        points: Vec<(f64, f64)>,
        half_size: f64,
    }

    impl MemorySource {
        fn inside<'a>(
            &'a self,
            bbox: &'a BoundingBox,
        ) -> impl Iterator<Item = &'a (f64, f64)> + 'a {
            self.points.iter().filter(move |(x, y)| {
                *x >= bbox.x_min && *x < bbox.x_max && *y >= bbox.y_min && *y < bbox.y_max
            })
        }
    }

    impl GeometrySource for MemorySource {
        fn feature_count(&self, bbox: &BoundingBox, _lod: Option<i64>) -> Result<u64, TreeError> {
            Ok(self.inside(bbox).count() as u64)
        }

        fn load_features(&self, bbox: &BoundingBox, _lod: Option<i64>) -> Result<FeatureSet, TreeError> {
            let records = self
                .inside(bbox)
                .enumerate()
                .map(|(i, &(x, y))| {
                    let h = self.half_size;
                    let ring = vec![
                        DVec3::new(x - h, y - h, 0.0),
                        DVec3::new(x + h, y - h, 0.0),
                        DVec3::new(x + h, y + h, 0.0),
                        DVec3::new(x - h, y + h, 0.0),
                        DVec3::new(x - h, y - h, 0.0),
                    ];
                    GeometryRecord::new(i as u32, Geometry::Polygon(Polygon::new(ring)))
                })
                .collect();
            Ok(FeatureSet {
                records,
                attributes: Default::default(),
            })
        }
    }

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tiletree_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_empty_dataset_root_unavailable() {
        let source = MemorySource {
            points: vec![],
            half_size: 0.1,
        };
        let cfg = TilerConfig {
            content_dir: test_dir("empty"),
            ..Default::default()
        };
        let tree = generate_tiles(&source, BoundingBox::new(0.0, 0.0, 8.0, 8.0), &cfg).unwrap();

        assert!(!tree.available);
        assert!(tree.children.is_empty());
        assert_eq!(tree.count_available(), 0);
        assert_eq!(std::fs::read_dir(&cfg.content_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_small_dataset_is_single_leaf() {
        let source = MemorySource {
            points: vec![(1.0, 1.0), (6.0, 6.0)],
            half_size: 0.1,
        };
        let cfg = TilerConfig {
            max_features_per_tile: 10,
            content_dir: test_dir("leaf"),
            ..Default::default()
        };
        let tree = generate_tiles(&source, BoundingBox::new(0.0, 0.0, 8.0, 8.0), &cfg).unwrap();

        assert!(tree.available);
        assert!(tree.children.is_empty());
        assert_eq!(tree.content.as_deref(), Some("0_0_0.glb"));
        assert!(cfg.content_dir.join("0_0_0.glb").exists());
    }

    #[test]
    fn test_dense_dataset_splits() {
        // One point per quadrant; threshold of 1 forces one split.
        let source = MemorySource {
            points: vec![(1.0, 1.0), (5.0, 1.0), (1.0, 5.0), (5.0, 5.0)],
            half_size: 0.1,
        };
        let cfg = TilerConfig {
            max_features_per_tile: 1,
            content_dir: test_dir("split"),
            ..Default::default()
        };
        let tree = generate_tiles(&source, BoundingBox::new(0.0, 0.0, 8.0, 8.0), &cfg).unwrap();

        assert!(!tree.available);
        assert_eq!(tree.children.len(), 4);
        assert_eq!(tree.count_available(), 4);
        for child in &tree.children {
            assert!(child.available);
            assert!(cfg.content_dir.join(child.content.as_deref().unwrap()).exists());
        }
    }

    #[test]
    fn test_deepest_detail_level_stops_recursion() {
        // Dense enough to keep splitting, but only two detail levels are
        // configured, so depth 1 tiles are accepted regardless.
        let source = MemorySource {
            points: vec![(1.0, 1.0), (1.2, 1.0), (5.0, 1.0), (1.0, 5.0), (5.0, 5.0)],
            half_size: 0.1,
        };
        let cfg = TilerConfig {
            max_features_per_tile: 1,
            lod_levels: vec![0, 1],
            content_dir: test_dir("lod"),
            ..Default::default()
        };
        let tree = generate_tiles(&source, BoundingBox::new(0.0, 0.0, 8.0, 8.0), &cfg).unwrap();

        assert_eq!(tree.max_depth(), 1);
        // The lower-left quadrant holds 2 features but is still a leaf.
        assert!(tree.find(TileId::new(1, 0, 0)).unwrap().available);
    }

    #[test]
    fn test_all_degenerate_tile_is_demoted() {
        // Zero-size squares collapse, so no triangles survive.
        let source = MemorySource {
            points: vec![(4.0, 4.0)],
            half_size: 0.0,
        };
        let cfg = TilerConfig {
            content_dir: test_dir("demote"),
            ..Default::default()
        };
        let tree = generate_tiles(&source, BoundingBox::new(0.0, 0.0, 8.0, 8.0), &cfg).unwrap();

        assert!(!tree.available);
        assert!(tree.content.is_none());
        assert_eq!(std::fs::read_dir(&cfg.content_dir).unwrap().count(), 0);
    }
}
