use crate::error::{MeshError, ShaderChannel};

/// Linear RGBA color, 0..=1 per channel.
pub type Rgba = [f32; 4];

/// Parse `#RRGGBB` or `#RRGGBBAA` into an RGBA color.
pub fn parse_hex_color(s: &str) -> Result<Rgba, MeshError> {
    let hex = s.strip_prefix('#').unwrap_or(s);

    let byte = |range: std::ops::Range<usize>| -> Result<f32, MeshError> {
        let v = u8::from_str_radix(
            hex.get(range).ok_or_else(|| MeshError::InvalidColor(s.to_owned()))?,
            16,
        )
        .map_err(|_| MeshError::InvalidColor(s.to_owned()))?;
        Ok(v as f32 / 255.0)
    };

    match hex.len() {
        6 => Ok([byte(0..2)?, byte(2..4)?, byte(4..6)?, 1.0]),
        8 => Ok([byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?]),
        _ => Err(MeshError::InvalidColor(s.to_owned())),
    }
}

/// Per-feature color tables. Either channel may be present; the
/// specular-glossiness diffuse channel wins when both are given, matching
/// how viewers resolve the legacy materials extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderColors {
    pub base_colors: Option<Vec<Rgba>>,
    pub diffuse_colors: Option<Vec<Rgba>>,
}

impl ShaderColors {
    pub fn from_base_hex(colors: &[String]) -> Result<Self, MeshError> {
        let parsed = colors
            .iter()
            .map(|c| parse_hex_color(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            base_colors: Some(parsed),
            diffuse_colors: None,
        })
    }

    pub fn from_diffuse_hex(colors: &[String]) -> Result<Self, MeshError> {
        let parsed = colors
            .iter()
            .map(|c| parse_hex_color(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            base_colors: None,
            diffuse_colors: Some(parsed),
        })
    }

    /// Length of the dominant channel, 0 when neither is set.
    pub fn count(&self) -> usize {
        self.diffuse_colors
            .as_ref()
            .or(self.base_colors.as_ref())
            .map_or(0, Vec::len)
    }

    /// Every present channel must have exactly `expected` entries. The
    /// error names the first channel that disagrees so the caller can
    /// report which table was mis-sized.
    pub fn validate(&self, expected: usize) -> Result<(), MeshError> {
        if let Some(diffuse) = &self.diffuse_colors {
            if diffuse.len() != expected {
                return Err(MeshError::ShaderCountMismatch {
                    channel: ShaderChannel::Diffuse,
                    expected,
                    actual: diffuse.len(),
                });
            }
        }
        if let Some(base) = &self.base_colors {
            if base.len() != expected {
                return Err(MeshError::ShaderCountMismatch {
                    channel: ShaderChannel::BaseColor,
                    expected,
                    actual: base.len(),
                });
            }
        }
        Ok(())
    }

    /// Resolved color for entry `i`, diffuse taking precedence.
    pub fn color_at(&self, i: usize) -> Option<Rgba> {
        self.diffuse_colors
            .as_ref()
            .or(self.base_colors.as_ref())
            .and_then(|colors| colors.get(i).copied())
    }
}
