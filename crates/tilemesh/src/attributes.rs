//! Per-feature attribute columns carried alongside tile content.
//!
//! The legacy wrapper embeds them as a batch table JSON document; the
//! modern payload encodes them as an `EXT_structural_metadata` property
//! table with binary columns. Both paths validate column lengths against
//! the feature count before encoding.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::MeshError;

/// One attribute value. Scalars, strings, and small fixed-size numeric
/// vectors/matrices; list values are only representable in the legacy
/// JSON table.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Vec3([f64; 3]),
    Mat4([f64; 16]),
    DoubleList(Vec<f64>),
    StringList(Vec<String>),
}

impl AttributeValue {
    fn type_tag(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::I8(_) => "i8",
            AttributeValue::U8(_) => "u8",
            AttributeValue::I16(_) => "i16",
            AttributeValue::U16(_) => "u16",
            AttributeValue::I32(_) => "i32",
            AttributeValue::U32(_) => "u32",
            AttributeValue::I64(_) => "i64",
            AttributeValue::U64(_) => "u64",
            AttributeValue::F32(_) => "f32",
            AttributeValue::F64(_) => "f64",
            AttributeValue::String(_) => "string",
            AttributeValue::Vec3(_) => "vec3",
            AttributeValue::Mat4(_) => "mat4",
            AttributeValue::DoubleList(_) => "double_list",
            AttributeValue::StringList(_) => "string_list",
        }
    }

    fn to_json(&self) -> Value {
        match self {
            AttributeValue::Bool(v) => json!(v),
            AttributeValue::I8(v) => json!(v),
            AttributeValue::U8(v) => json!(v),
            AttributeValue::I16(v) => json!(v),
            AttributeValue::U16(v) => json!(v),
            AttributeValue::I32(v) => json!(v),
            AttributeValue::U32(v) => json!(v),
            AttributeValue::I64(v) => json!(v),
            AttributeValue::U64(v) => json!(v),
            AttributeValue::F32(v) => json!(v),
            AttributeValue::F64(v) => json!(v),
            AttributeValue::String(v) => json!(v),
            AttributeValue::Vec3(v) => json!(v),
            AttributeValue::Mat4(v) => json!(v.to_vec()),
            AttributeValue::DoubleList(v) => json!(v),
            AttributeValue::StringList(v) => json!(v),
        }
    }
}

/// Attribute columns keyed by name; row order follows batch id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeTable {
    pub columns: BTreeMap<String, Vec<AttributeValue>>,
}

impl AttributeTable {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<AttributeValue>) {
        self.columns.insert(name.into(), values);
    }

    /// Each column must hold one value per feature and a single value
    /// type throughout.
    pub fn validate(&self, feature_count: usize) -> Result<(), MeshError> {
        for (name, values) in &self.columns {
            if values.len() != feature_count {
                return Err(MeshError::AttributeLengthMismatch {
                    column: name.clone(),
                    expected: feature_count,
                    actual: values.len(),
                });
            }
            if let Some(first) = values.first() {
                if values.iter().any(|v| v.type_tag() != first.type_tag()) {
                    return Err(MeshError::AttributeTypeMismatch {
                        column: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Batch table JSON for the legacy wrapper: one JSON array per column.
    pub fn to_batch_table_json(&self) -> Value {
        let mut obj = serde_json::Map::new();
        for (name, values) in &self.columns {
            let array: Vec<Value> = values.iter().map(AttributeValue::to_json).collect();
            obj.insert(name.clone(), Value::Array(array));
        }
        Value::Object(obj)
    }

    /// Encode every column into `buffer`, returning the property-table
    /// JSON fragments: (class properties, property table properties,
    /// buffer view descriptors). View offsets are absolute within
    /// `buffer`, which may already hold mesh data.
    pub fn encode_property_table(
        &self,
        buffer: &mut Vec<u8>,
        buffer_index: usize,
    ) -> Result<(Value, Value, Vec<Value>), MeshError> {
        let mut class_props = serde_json::Map::new();
        let mut table_props = serde_json::Map::new();
        let mut views: Vec<Value> = Vec::new();

        let mut push_view = |buffer: &mut Vec<u8>, bytes: Vec<u8>, views: &mut Vec<Value>| -> usize {
            // 8-byte alignment keeps every component type in bounds.
            while buffer.len() % 8 != 0 {
                buffer.push(0);
            }
            let view = json!({
                "buffer": buffer_index,
                "byteOffset": buffer.len(),
                "byteLength": bytes.len(),
            });
            buffer.extend_from_slice(&bytes);
            views.push(view);
            views.len() - 1
        };

        for (name, values) in &self.columns {
            let first = values.first().ok_or_else(|| MeshError::AttributeShapeUnsupported {
                column: name.clone(),
                format: "glTF property table",
            })?;

            let (class_def, column_bytes, string_offsets): (Value, Vec<u8>, Option<Vec<u8>>) =
                match first {
                    AttributeValue::Bool(_) => {
                        let mut bits = vec![0u8; (values.len() + 7) / 8];
                        for (i, v) in values.iter().enumerate() {
                            if matches!(v, AttributeValue::Bool(true)) {
                                bits[i / 8] |= 1 << (i % 8);
                            }
                        }
                        (json!({"type": "BOOLEAN"}), bits, None)
                    }
                    AttributeValue::I8(_) => scalar_column(values, "INT8", |v, out| {
                        if let AttributeValue::I8(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::U8(_) => scalar_column(values, "UINT8", |v, out| {
                        if let AttributeValue::U8(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::I16(_) => scalar_column(values, "INT16", |v, out| {
                        if let AttributeValue::I16(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::U16(_) => scalar_column(values, "UINT16", |v, out| {
                        if let AttributeValue::U16(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::I32(_) => scalar_column(values, "INT32", |v, out| {
                        if let AttributeValue::I32(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::U32(_) => scalar_column(values, "UINT32", |v, out| {
                        if let AttributeValue::U32(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::I64(_) => scalar_column(values, "INT64", |v, out| {
                        if let AttributeValue::I64(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::U64(_) => scalar_column(values, "UINT64", |v, out| {
                        if let AttributeValue::U64(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::F32(_) => scalar_column(values, "FLOAT32", |v, out| {
                        if let AttributeValue::F32(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::F64(_) => scalar_column(values, "FLOAT64", |v, out| {
                        if let AttributeValue::F64(x) = v {
                            out.extend_from_slice(&x.to_le_bytes());
                        }
                    }),
                    AttributeValue::String(_) => {
                        let mut bytes = Vec::new();
                        let mut offsets = Vec::with_capacity((values.len() + 1) * 4);
                        offsets.extend_from_slice(&0u32.to_le_bytes());
                        for v in values {
                            if let AttributeValue::String(s) = v {
                                bytes.extend_from_slice(s.as_bytes());
                            }
                            offsets.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                        }
                        (json!({"type": "STRING"}), bytes, Some(offsets))
                    }
                    AttributeValue::Vec3(_) => {
                        let mut bytes = Vec::with_capacity(values.len() * 24);
                        for v in values {
                            if let AttributeValue::Vec3(arr) = v {
                                for c in arr {
                                    bytes.extend_from_slice(&c.to_le_bytes());
                                }
                            }
                        }
                        (json!({"type": "VEC3", "componentType": "FLOAT64"}), bytes, None)
                    }
                    AttributeValue::Mat4(_) => {
                        let mut bytes = Vec::with_capacity(values.len() * 128);
                        for v in values {
                            if let AttributeValue::Mat4(arr) = v {
                                for c in arr {
                                    bytes.extend_from_slice(&c.to_le_bytes());
                                }
                            }
                        }
                        (json!({"type": "MAT4", "componentType": "FLOAT64"}), bytes, None)
                    }
                    AttributeValue::DoubleList(_) | AttributeValue::StringList(_) => {
                        return Err(MeshError::AttributeShapeUnsupported {
                            column: name.clone(),
                            format: "glTF property table",
                        });
                    }
                };

            let values_view = push_view(buffer, column_bytes, &mut views);
            let mut table_prop = json!({"values": values_view});
            if let Some(offsets) = string_offsets {
                let offsets_view = push_view(buffer, offsets, &mut views);
                table_prop["stringOffsets"] = json!(offsets_view);
                table_prop["stringOffsetType"] = json!("UINT32");
            }

            class_props.insert(name.clone(), class_def);
            table_props.insert(name.clone(), table_prop);
        }

        Ok((Value::Object(class_props), Value::Object(table_props), views))
    }
}

fn scalar_column(
    values: &[AttributeValue],
    component: &str,
    write: impl Fn(&AttributeValue, &mut Vec<u8>),
) -> (Value, Vec<u8>, Option<Vec<u8>>) {
    let mut bytes = Vec::new();
    for v in values {
        write(v, &mut bytes);
    }
    (
        json!({"type": "SCALAR", "componentType": component}),
        bytes,
        None,
    )
}
