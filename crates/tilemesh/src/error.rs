use thiserror::Error;

/// Color channel a shader color table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderChannel {
    /// Metallic-roughness base color.
    BaseColor,
    /// Specular-glossiness diffuse color.
    Diffuse,
}

impl std::fmt::Display for ShaderChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderChannel::BaseColor => f.write_str("BaseColor"),
            ShaderChannel::Diffuse => f.write_str("Diffuse"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("geometry type {0} is not supported")]
    UnsupportedGeometry(&'static str),

    #[error("{channel} color count mismatch: expected {expected}, actual {actual}")]
    ShaderCountMismatch {
        channel: ShaderChannel,
        expected: usize,
        actual: usize,
    },

    #[error("invalid color literal {0:?}, expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("ring with {0} points cannot be triangulated")]
    DegenerateRing(usize),

    #[error("attribute column {column:?} has {actual} values, expected {expected}")]
    AttributeLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("attribute column {column:?} mixes value types")]
    AttributeTypeMismatch { column: String },

    #[error("attribute column {column:?} has a value shape not supported by {format}")]
    AttributeShapeUnsupported {
        column: String,
        format: &'static str,
    },
}
