//! Tileset descriptor documents.
//!
//! Two renditions of the same realized tree: an explicit descriptor that
//! mirrors the tree node by node (optionally split into external
//! documents at a fixed depth), and an implicit descriptor whose root
//! carries templated content and subtree URIs.

use glam::DVec3;
use serde::Serialize;

use crate::error::TreeError;
use crate::tile::Tile;
use tilemesh::TileFormat;

pub const TILESET_VERSION: &str = "1.1";

#[derive(Debug, Serialize)]
pub struct Asset {
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tileset {
    pub asset: Asset,
    pub geometric_error: f64,
    pub root: TileJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Refine {
    #[serde(rename = "REPLACE")]
    Replace,
    #[serde(rename = "ADD")]
    Add,
}

#[derive(Debug, Serialize)]
pub struct BoundingVolume {
    pub region: [f64; 6],
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct Subtrees {
    pub uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImplicitTiling {
    pub subdivision_scheme: String,
    pub subtree_levels: u32,
    pub available_levels: u32,
    pub subtrees: Subtrees,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileJson {
    pub bounding_volume: BoundingVolume,
    pub geometric_error: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refine: Option<Refine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<[f64; 16]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TileJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit_tiling: Option<ImplicitTiling>,
}

#[derive(Debug, Clone)]
pub struct TilesetParams {
    /// Geometric errors per depth, coarse to fine. Must be non-empty;
    /// depths past the end continue halving from the last entry.
    pub geometric_errors: Vec<f64>,
    pub refine: Refine,
    /// Height range of the dataset in meters, fed into every region.
    pub min_height: f64,
    pub max_height: f64,
    /// Root transform translation (column-major indices 12..15).
    pub translation: DVec3,
    /// Directory prefix of the content URIs.
    pub content_dir: String,
    pub format: TileFormat,
    /// Explicit descriptors only: subtrees rooted at this depth move to
    /// external `tileset_{z}_{x}_{y}.json` documents.
    pub split_depth: Option<u32>,
}

impl Default for TilesetParams {
    fn default() -> Self {
        Self {
            geometric_errors: vec![500.0],
            refine: Refine::Replace,
            min_height: 0.0,
            max_height: 0.0,
            translation: DVec3::ZERO,
            content_dir: "content".to_owned(),
            format: TileFormat::Glb,
            split_depth: None,
        }
    }
}

/// Error for `depth`, halving past the end of the configured list.
pub fn error_for_depth(errors: &[f64], depth: u32) -> f64 {
    let depth = depth as usize;
    if let Some(e) = errors.get(depth) {
        return *e;
    }
    let last = errors.last().copied().unwrap_or(0.0);
    last / 2f64.powi((depth + 1 - errors.len()) as i32)
}

/// Halving sequence `e0 / 2^i` for `levels` depths.
pub fn geometric_errors(e0: f64, levels: u32) -> Vec<f64> {
    (0..levels).map(|i| e0 / 2f64.powi(i as i32)).collect()
}

fn translation_transform(t: DVec3) -> [f64; 16] {
    let mut m = [0.0; 16];
    m[0] = 1.0;
    m[5] = 1.0;
    m[10] = 1.0;
    m[12] = t.x;
    m[13] = t.y;
    m[14] = t.z;
    m[15] = 1.0;
    m
}

fn region_of(tile: &Tile, params: &TilesetParams) -> BoundingVolume {
    let bbox = tile.available_extent().unwrap_or(tile.bbox);
    BoundingVolume {
        region: bbox.to_region(params.min_height, params.max_height),
    }
}

fn tileset_with_root(root: TileJson, geometric_error: f64) -> Tileset {
    Tileset {
        asset: Asset {
            version: TILESET_VERSION.to_owned(),
        },
        geometric_error,
        root,
    }
}

/// Build the explicit descriptor set: `("tileset.json", ..)` first,
/// followed by any external split documents. Subtrees without available
/// content are pruned.
pub fn explicit_tilesets(
    tree: &Tile,
    params: &TilesetParams,
) -> Result<Vec<(String, Tileset)>, TreeError> {
    if params.geometric_errors.is_empty() {
        return Err(TreeError::Config(
            "at least one geometric error is required".to_owned(),
        ));
    }

    let mut extra = Vec::new();
    let mut root = explicit_node(tree, params, &mut extra);
    root.transform = Some(translation_transform(params.translation));

    let mut out = Vec::with_capacity(1 + extra.len());
    out.push((
        "tileset.json".to_owned(),
        tileset_with_root(root, params.geometric_errors[0]),
    ));
    out.extend(extra);
    Ok(out)
}

fn explicit_node(
    tile: &Tile,
    params: &TilesetParams,
    extra: &mut Vec<(String, Tileset)>,
) -> TileJson {
    let live_children: Vec<&Tile> = tile
        .children
        .iter()
        .filter(|c| c.count_available() > 0)
        .collect();

    // Content tiles are leaves; interior nodes carry the halved error.
    let geometric_error = if live_children.is_empty() {
        0.0
    } else {
        error_for_depth(&params.geometric_errors, tile.id.z + 1)
    };

    let mut node = TileJson {
        bounding_volume: region_of(tile, params),
        geometric_error,
        refine: Some(params.refine),
        transform: None,
        content: tile.content.as_ref().map(|name| Content {
            uri: format!("{}/{}", params.content_dir, name),
        }),
        children: Vec::new(),
        implicit_tiling: None,
    };

    for child in live_children {
        if params.split_depth == Some(child.id.z) {
            // The subtree moves to its own document; this node points at
            // it through a content uri.
            let doc = format!("tileset_{}.json", child.id);
            let sub_root = explicit_node(child, params, extra);
            extra.push((
                doc.clone(),
                tileset_with_root(
                    sub_root,
                    error_for_depth(&params.geometric_errors, child.id.z),
                ),
            ));
            node.children.push(TileJson {
                bounding_volume: region_of(child, params),
                geometric_error: error_for_depth(&params.geometric_errors, child.id.z),
                refine: Some(params.refine),
                transform: None,
                content: Some(Content { uri: doc }),
                children: Vec::new(),
                implicit_tiling: None,
            });
        } else {
            node.children.push(explicit_node(child, params, extra));
        }
    }

    node
}

/// Build the implicit descriptor: one templated root covering the whole
/// tree, with availability delegated to subtree files.
pub fn implicit_tileset(
    tree: &Tile,
    params: &TilesetParams,
    subtree_levels: u32,
) -> Result<Tileset, TreeError> {
    if params.geometric_errors.is_empty() {
        return Err(TreeError::Config(
            "at least one geometric error is required".to_owned(),
        ));
    }
    if subtree_levels == 0 {
        return Err(TreeError::Config(
            "subtree levels must be at least 1".to_owned(),
        ));
    }

    let root = TileJson {
        bounding_volume: BoundingVolume {
            region: tree.bbox.to_region(params.min_height, params.max_height),
        },
        geometric_error: params.geometric_errors[0],
        refine: Some(params.refine),
        transform: Some(translation_transform(params.translation)),
        content: Some(Content {
            uri: format!(
                "{}/{{level}}_{{x}}_{{y}}.{}",
                params.content_dir,
                params.format.extension()
            ),
        }),
        children: Vec::new(),
        implicit_tiling: Some(ImplicitTiling {
            subdivision_scheme: "QUADTREE".to_owned(),
            subtree_levels,
            available_levels: tree.max_depth() + 1,
            subtrees: Subtrees {
                uri: "subtrees/{level}/{x}/{y}.subtree".to_owned(),
            },
        }),
    };

    Ok(tileset_with_root(root, params.geometric_errors[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundingBox;
    use crate::tile::TileId;

    fn leaf(id: TileId, bbox: BoundingBox) -> Tile {
        let mut t = Tile::unavailable(id, bbox);
        t.available = true;
        t.content = Some(format!("{id}.glb"));
        t
    }

    fn split_tree() -> Tile {
        let bbox = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let mut root = Tile::unavailable(TileId::ROOT, bbox);
        root.children = TileId::ROOT
            .children()
            .into_iter()
            .zip(bbox.split())
            .map(|(id, b)| leaf(id, b))
            .collect();
        root
    }

    #[test]
    fn test_errors_halve_per_level() {
        let errors = geometric_errors(500.0, 4);
        assert_eq!(errors, vec![500.0, 250.0, 125.0, 62.5]);
        for pair in errors.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn test_error_for_depth_extends_by_halving() {
        let errors = vec![500.0, 100.0];
        assert_eq!(error_for_depth(&errors, 0), 500.0);
        assert_eq!(error_for_depth(&errors, 1), 100.0);
        assert_eq!(error_for_depth(&errors, 2), 50.0);
        assert_eq!(error_for_depth(&errors, 4), 12.5);
    }

    #[test]
    fn test_explicit_tree_shape() {
        let docs = explicit_tilesets(&split_tree(), &TilesetParams::default()).unwrap();
        assert_eq!(docs.len(), 1);
        let (name, tileset) = &docs[0];
        assert_eq!(name, "tileset.json");
        assert_eq!(tileset.geometric_error, 500.0);

        let root = &tileset.root;
        assert_eq!(root.children.len(), 4);
        assert_eq!(root.geometric_error, 250.0);
        assert!(root.content.is_none());
        let t = root.transform.unwrap();
        assert_eq!(t[0], 1.0);
        assert_eq!(t[15], 1.0);

        for child in &root.children {
            assert_eq!(child.geometric_error, 0.0);
            assert!(child.children.is_empty());
            assert!(child.content.as_ref().unwrap().uri.starts_with("content/1_"));
        }
    }

    #[test]
    fn test_explicit_unavailable_root_has_no_children() {
        let tree = Tile::unavailable(TileId::ROOT, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let docs = explicit_tilesets(&tree, &TilesetParams::default()).unwrap();
        let root = &docs[0].1.root;
        assert!(root.children.is_empty());
        assert!(root.content.is_none());
    }

    #[test]
    fn test_explicit_split_documents() {
        let params = TilesetParams {
            split_depth: Some(1),
            ..Default::default()
        };
        let docs = explicit_tilesets(&split_tree(), &params).unwrap();
        // Main document plus one external document per available child.
        assert_eq!(docs.len(), 5);
        assert_eq!(docs[0].0, "tileset.json");
        assert!(docs.iter().any(|(n, _)| n == "tileset_1_0_0.json"));

        let root = &docs[0].1.root;
        for child in &root.children {
            let uri = &child.content.as_ref().unwrap().uri;
            assert!(uri.starts_with("tileset_1_") && uri.ends_with(".json"));
            assert!(child.children.is_empty());
        }

        // External documents carry no root transform of their own.
        let (_, external) = docs.iter().find(|(n, _)| n == "tileset_1_0_0.json").unwrap();
        assert!(external.root.transform.is_none());
        assert!(external.root.content.is_some());
    }

    #[test]
    fn test_explicit_region_shrinks_to_available_extent() {
        let bbox = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let mut root = Tile::unavailable(TileId::ROOT, bbox);
        // Only the lower-left quadrant holds content.
        root.children = vec![leaf(TileId::new(1, 0, 0), bbox.split()[0])];

        let docs = explicit_tilesets(&root, &TilesetParams::default()).unwrap();
        let region = docs[0].1.root.bounding_volume.region;
        assert!((region[2] - 2f64.to_radians()).abs() < 1e-12);
        assert!((region[3] - 2f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_implicit_root_templates() {
        let tileset = implicit_tileset(&split_tree(), &TilesetParams::default(), 4).unwrap();
        let root = &tileset.root;

        let tiling = root.implicit_tiling.as_ref().unwrap();
        assert_eq!(tiling.subdivision_scheme, "QUADTREE");
        assert_eq!(tiling.subtree_levels, 4);
        assert_eq!(tiling.available_levels, 2);
        assert_eq!(tiling.subtrees.uri, "subtrees/{level}/{x}/{y}.subtree");
        assert_eq!(
            root.content.as_ref().unwrap().uri,
            "content/{level}_{x}_{y}.glb"
        );

        let json = serde_json::to_value(&tileset).unwrap();
        assert!(json["root"]["implicitTiling"]["subtreeLevels"].is_u64());
        assert_eq!(json["asset"]["version"], "1.1");
    }

    #[test]
    fn test_refine_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Refine::Replace).unwrap(), "\"REPLACE\"");
        assert_eq!(serde_json::to_string(&Refine::Add).unwrap(), "\"ADD\"");
    }
}
