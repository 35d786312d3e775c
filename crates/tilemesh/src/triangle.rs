use glam::DVec3;

use crate::shader::Rgba;

/// Squared-area threshold below which a triangle is treated as degenerate.
const MIN_AREA_SQ: f64 = 1e-16;

/// One renderable triangle in tile-local coordinates, linked back to the
/// source feature by its batch id.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub p0: DVec3,
    pub p1: DVec3,
    pub p2: DVec3,
    pub batch_id: u32,
    pub color: Option<Rgba>,
}

impl Triangle {
    pub fn new(p0: DVec3, p1: DVec3, p2: DVec3, batch_id: u32) -> Self {
        Self {
            p0,
            p1,
            p2,
            batch_id,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Option<Rgba>) -> Self {
        self.color = color;
        self
    }

    /// Unit face normal. Zero vector for degenerate triangles.
    pub fn normal(&self) -> DVec3 {
        let cross = (self.p1 - self.p0).cross(self.p2 - self.p0);
        cross.try_normalize().unwrap_or(DVec3::ZERO)
    }

    /// Zero or negligible area, or duplicate vertices. These are dropped
    /// at encoding time, not treated as errors.
    pub fn is_degenerate(&self) -> bool {
        if self.p0 == self.p1 || self.p1 == self.p2 || self.p2 == self.p0 {
            return true;
        }
        let cross = (self.p1 - self.p0).cross(self.p2 - self.p0);
        cross.length_squared() < MIN_AREA_SQ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_direction() {
        let t = Triangle::new(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            0,
        );
        assert_eq!(t.normal(), DVec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_degenerate_detection() {
        let zero = DVec3::ZERO;
        let collapsed = Triangle::new(zero, zero, zero, 0);
        assert!(collapsed.is_degenerate());

        let collinear = Triangle::new(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            0,
        );
        assert!(collinear.is_degenerate());

        let ok = Triangle::new(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            0,
        );
        assert!(!ok.is_degenerate());
    }
}
