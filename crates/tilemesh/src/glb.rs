//! Binary tile content encoding.
//!
//! GLB layout (little-endian):
//!   00 : u32 magic = "glTF"
//!   04 : u32 version = 2
//!   08 : u32 total byte length
//!   0C : JSON chunk (u32 length, u32 type "JSON", payload space-padded to 4)
//!   .. : BIN  chunk (u32 length, u32 type "BIN\0", payload zero-padded to 4)
//!
//! Triangles sharing one resolved color merge into a single primitive;
//! varying per-feature colors emit one primitive per distinct color.
//! Attribute columns become an EXT_structural_metadata property table in
//! the binary buffer. Encoding a batch with zero surviving triangles
//! yields no content, never an empty buffer.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde_json::{json, Value};

use crate::attributes::AttributeTable;
use crate::error::MeshError;
use crate::shader::Rgba;
use crate::triangle::Triangle;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const COMPONENT_F32: u32 = 5126;
const COMPONENT_U32: u32 = 5125;

/// Material and wrapper options for tile content.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Color for triangles without a per-feature shader color.
    pub default_color: Rgba,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub double_sided: bool,
    /// Emit CESIUM_primitive_outline edge lists per primitive.
    pub add_outlines: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            default_color: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 0.0,
            roughness_factor: 1.0,
            double_sided: true,
            add_outlines: false,
        }
    }
}

/// Outer wrapper for encoded tile content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFormat {
    /// Bare glTF binary payload (3D Tiles 1.1).
    Glb,
    /// Legacy batched-3D-model container embedding the payload.
    B3dm,
}

impl TileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Glb => "glb",
            TileFormat::B3dm => "b3dm",
        }
    }
}

/// Encode one tile. `batches` holds the triangles per feature, indexed by
/// batch id order; `attributes` rows must match `batches.len()`.
pub fn encode_tile(
    batches: &[Vec<Triangle>],
    attributes: Option<&AttributeTable>,
    format: TileFormat,
    opts: &EncodeOptions,
) -> Result<Option<Vec<u8>>, MeshError> {
    if let Some(table) = attributes {
        table.validate(batches.len())?;
    }

    match format {
        TileFormat::Glb => encode_glb(batches, attributes, opts),
        TileFormat::B3dm => {
            let glb = encode_glb(batches, None, opts)?;
            Ok(glb.map(|payload| wrap_b3dm(payload, attributes, batches.len())))
        }
    }
}

/// Build the glTF binary payload, or `None` when every triangle is
/// degenerate.
pub fn encode_glb(
    batches: &[Vec<Triangle>],
    attributes: Option<&AttributeTable>,
    opts: &EncodeOptions,
) -> Result<Option<Vec<u8>>, MeshError> {
    let total: usize = batches.iter().map(Vec::len).sum();
    let surviving: Vec<&Triangle> = batches
        .iter()
        .flatten()
        .filter(|t| !t.is_degenerate())
        .collect();

    if surviving.len() < total {
        debug!("dropped {} degenerate triangles", total - surviving.len());
    }
    if surviving.is_empty() {
        return Ok(None);
    }

    // Group by resolved color; identical colors share one primitive.
    let mut groups: BTreeMap<[u8; 4], Vec<&Triangle>> = BTreeMap::new();
    for t in surviving {
        let rgba = t.color.unwrap_or(opts.default_color);
        groups.entry(quantize(rgba)).or_default().push(t);
    }

    let mut buffer: Vec<u8> = Vec::new();
    let mut buffer_views: Vec<Value> = Vec::new();
    let mut accessors: Vec<Value> = Vec::new();
    let mut materials: Vec<Value> = Vec::new();
    let mut primitives: Vec<Value> = Vec::new();

    let with_metadata = attributes.map_or(false, |t| !t.is_empty());

    for triangles in groups.values() {
        let vertex_count = triangles.len() * 3;
        let mut positions = Vec::with_capacity(vertex_count * 3);
        let mut normals = Vec::with_capacity(vertex_count * 3);
        let mut batch_ids = Vec::with_capacity(vertex_count);
        let mut feature_ids: BTreeSet<u32> = BTreeSet::new();

        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];

        for t in triangles.iter() {
            let n = t.normal();
            for p in [t.p0, t.p1, t.p2] {
                let v = [p.x as f32, p.y as f32, p.z as f32];
                for k in 0..3 {
                    min[k] = min[k].min(v[k]);
                    max[k] = max[k].max(v[k]);
                }
                positions.extend_from_slice(&v);
                normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
                batch_ids.push(t.batch_id as f32);
            }
            feature_ids.insert(t.batch_id);
        }

        let pos_view = push_view(
            &mut buffer,
            &mut buffer_views,
            bytemuck::cast_slice(&positions),
            Some(TARGET_ARRAY_BUFFER),
        );
        let pos_accessor = accessors.len();
        accessors.push(json!({
            "bufferView": pos_view,
            "componentType": COMPONENT_F32,
            "count": vertex_count,
            "type": "VEC3",
            "min": min,
            "max": max,
        }));

        let normal_view = push_view(
            &mut buffer,
            &mut buffer_views,
            bytemuck::cast_slice(&normals),
            Some(TARGET_ARRAY_BUFFER),
        );
        let normal_accessor = accessors.len();
        accessors.push(json!({
            "bufferView": normal_view,
            "componentType": COMPONENT_F32,
            "count": vertex_count,
            "type": "VEC3",
        }));

        let batch_view = push_view(
            &mut buffer,
            &mut buffer_views,
            bytemuck::cast_slice(&batch_ids),
            Some(TARGET_ARRAY_BUFFER),
        );
        let batch_accessor = accessors.len();
        accessors.push(json!({
            "bufferView": batch_view,
            "componentType": COMPONENT_F32,
            "count": vertex_count,
            "type": "SCALAR",
        }));

        let material_index = materials.len();
        let rgba = triangles[0].color.unwrap_or(opts.default_color);
        materials.push(json!({
            "pbrMetallicRoughness": {
                "baseColorFactor": rgba,
                "metallicFactor": opts.metallic_factor,
                "roughnessFactor": opts.roughness_factor,
            },
            "doubleSided": opts.double_sided,
        }));

        let mut primitive = json!({
            "attributes": {
                "POSITION": pos_accessor,
                "NORMAL": normal_accessor,
                "_BATCHID": batch_accessor,
                "_FEATURE_ID_0": batch_accessor,
            },
            "material": material_index,
            "mode": 4,
        });

        if opts.add_outlines {
            // Edge list over the non-indexed vertex stream.
            let mut edges: Vec<u32> = Vec::with_capacity(vertex_count * 2);
            for t in 0..triangles.len() as u32 {
                let base = t * 3;
                edges.extend_from_slice(&[base, base + 1, base + 1, base + 2, base + 2, base]);
            }
            let edge_view = push_view(
                &mut buffer,
                &mut buffer_views,
                bytemuck::cast_slice(&edges),
                Some(TARGET_ELEMENT_ARRAY_BUFFER),
            );
            let edge_accessor = accessors.len();
            accessors.push(json!({
                "bufferView": edge_view,
                "componentType": COMPONENT_U32,
                "count": edges.len(),
                "type": "SCALAR",
            }));
            primitive["extensions"] = json!({
                "CESIUM_primitive_outline": {"indices": edge_accessor}
            });
        }

        if with_metadata {
            let features = json!({
                "featureIds": [{
                    "featureCount": feature_ids.len(),
                    "attribute": 0,
                    "propertyTable": 0,
                }]
            });
            if primitive.get("extensions").is_some() {
                primitive["extensions"]["EXT_mesh_features"] = features;
            } else {
                primitive["extensions"] = json!({"EXT_mesh_features": features});
            }
        }

        primitives.push(primitive);
    }

    let mut extensions_used: Vec<&str> = Vec::new();
    if opts.add_outlines {
        extensions_used.push("CESIUM_primitive_outline");
    }

    let mut root_extensions = serde_json::Map::new();
    if with_metadata {
        let table = attributes.expect("with_metadata implies attributes");
        let (class_props, table_props, metadata_views) =
            table.encode_property_table(&mut buffer, 0)?;
        buffer_views.extend(metadata_views);
        extensions_used.push("EXT_mesh_features");
        extensions_used.push("EXT_structural_metadata");
        root_extensions.insert(
            "EXT_structural_metadata".to_owned(),
            json!({
                "schema": {
                    "id": "features",
                    "classes": {"feature": {"properties": class_props}},
                },
                "propertyTables": [{
                    "class": "feature",
                    "count": batches.len(),
                    "properties": table_props,
                }],
            }),
        );
    }

    let mut gltf = json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0}],
        "meshes": [{"primitives": primitives}],
        "materials": materials,
        "accessors": accessors,
        "bufferViews": buffer_views,
        "buffers": [{"byteLength": buffer.len()}],
    });
    if !extensions_used.is_empty() {
        gltf["extensionsUsed"] = json!(extensions_used);
    }
    if !root_extensions.is_empty() {
        gltf["extensions"] = Value::Object(root_extensions);
    }

    Ok(Some(pack_glb(&gltf, buffer)))
}

fn quantize(rgba: Rgba) -> [u8; 4] {
    [
        (rgba[0].clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgba[1].clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgba[2].clamp(0.0, 1.0) * 255.0).round() as u8,
        (rgba[3].clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

fn push_view(
    buffer: &mut Vec<u8>,
    views: &mut Vec<Value>,
    bytes: &[u8],
    target: Option<u32>,
) -> usize {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
    let mut view = json!({
        "buffer": 0,
        "byteOffset": buffer.len(),
        "byteLength": bytes.len(),
    });
    if let Some(t) = target {
        view["target"] = json!(t);
    }
    buffer.extend_from_slice(bytes);
    views.push(view);
    views.len() - 1
}

fn pack_glb(gltf: &Value, bin: Vec<u8>) -> Vec<u8> {
    let mut json_bytes = serde_json::to_vec(gltf).expect("glTF JSON is serializable");
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    let mut bin_bytes = bin;
    while bin_bytes.len() % 4 != 0 {
        bin_bytes.push(0);
    }

    let total = 12 + 8 + json_bytes.len() + 8 + bin_bytes.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_bytes);
    out.extend_from_slice(&(bin_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    out.extend_from_slice(&bin_bytes);
    out
}

/// Legacy wrapper: 28-byte header, feature table JSON, batch table JSON,
/// inner GLB, all sections padded so the GLB starts 8-byte aligned.
fn wrap_b3dm(glb: Vec<u8>, attributes: Option<&AttributeTable>, batch_length: usize) -> Vec<u8> {
    const HEADER_LEN: usize = 28;

    let feature_table = json!({"BATCH_LENGTH": batch_length});
    let mut ft_json = serde_json::to_vec(&feature_table).expect("feature table is serializable");
    while (HEADER_LEN + ft_json.len()) % 8 != 0 {
        ft_json.push(b' ');
    }

    let mut bt_json = match attributes {
        Some(table) if !table.is_empty() => {
            serde_json::to_vec(&table.to_batch_table_json()).expect("batch table is serializable")
        }
        _ => Vec::new(),
    };
    while !bt_json.is_empty() && (HEADER_LEN + ft_json.len() + bt_json.len()) % 8 != 0 {
        bt_json.push(b' ');
    }

    let mut payload = glb;
    while payload.len() % 8 != 0 {
        payload.push(0);
    }

    let total = HEADER_LEN + ft_json.len() + bt_json.len() + payload.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"b3dm");
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(ft_json.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // feature table binary
    out.extend_from_slice(&(bt_json.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // batch table binary
    out.extend_from_slice(&ft_json);
    out.extend_from_slice(&bt_json);
    out.extend_from_slice(&payload);
    out
}
