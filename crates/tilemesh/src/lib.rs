//! Triangulation of vector geometries into renderable batches and
//! binary tile content encoding (bare GLB or legacy B3DM wrapper).
//!
//! The pipeline is: [`GeometryRecord`] → [`triangles_for`] →
//! [`encode_tile`]. Triangulation works in tile-local coordinates (the
//! processor subtracts a translation before clipping), the encoder
//! groups triangles into primitives by per-feature color and embeds
//! attribute columns as a side table keyed by batch id.

pub mod attributes;
pub mod error;
pub mod geometry;
pub mod glb;
pub mod shader;
pub mod triangle;
pub mod triangulate;

pub use attributes::{AttributeTable, AttributeValue};
pub use error::{MeshError, ShaderChannel};
pub use geometry::{Geometry, GeometryRecord, Polygon, Ring};
pub use glb::{encode_glb, encode_tile, EncodeOptions, TileFormat};
pub use shader::{parse_hex_color, Rgba, ShaderColors};
pub use triangle::Triangle;
pub use triangulate::{triangles_for, ProcessorConfig, TubeParams};
