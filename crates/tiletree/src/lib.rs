//! Quadtree tiling of vector-geometry datasets into 3D Tiles output:
//! density-driven subdivision, per-tile content generation, subtree
//! availability files and tileset descriptors.

pub mod bbox;
pub mod error;
pub mod geodetic;
pub mod source;
pub mod subtree;
pub mod tile;
pub mod tiler;
pub mod tileset;

pub use bbox::BoundingBox;
pub use error::TreeError;
pub use geodetic::{geodetic_to_ecef, root_translation, wgs84_to_spherical_mercator, SRID_ECEF};
pub use source::{FeatureSet, GeometrySource};
pub use subtree::encode_subtrees;
pub use tile::{Tile, TileId};
pub use tiler::{generate_tiles, TilerConfig};
pub use tileset::{
    error_for_depth, explicit_tilesets, geometric_errors, implicit_tileset, Refine, Tileset,
    TilesetParams,
};
