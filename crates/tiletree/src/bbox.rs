/// Planar axis-aligned bounding box in the working geographic frame
/// (WGS-84 degrees for lon/lat sources, meters for projected ones).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.x_min + self.x_max),
            0.5 * (self.y_min + self.y_max),
        )
    }

    /// Quadrant subdivision in child order: lower-left, lower-right,
    /// upper-left, upper-right.
    pub fn split(&self) -> [BoundingBox; 4] {
        let (cx, cy) = self.center();
        [
            BoundingBox::new(self.x_min, self.y_min, cx, cy),
            BoundingBox::new(cx, self.y_min, self.x_max, cy),
            BoundingBox::new(self.x_min, cy, cx, self.y_max),
            BoundingBox::new(cx, cy, self.x_max, self.y_max),
        ]
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.x_min.min(other.x_min),
            self.y_min.min(other.y_min),
            self.x_max.max(other.x_max),
            self.y_max.max(other.y_max),
        )
    }

    /// 3D Tiles region bounding volume: [west, south, east, north] in
    /// radians plus the height range in meters. Only meaningful when the
    /// box is in lon/lat degrees.
    pub fn to_region(&self, min_height: f64, max_height: f64) -> [f64; 6] {
        [
            self.x_min.to_radians(),
            self.y_min.to_radians(),
            self.x_max.to_radians(),
            self.y_max.to_radians(),
            min_height,
            max_height,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_quadrants() {
        let bbox = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let quads = bbox.split();
        assert_eq!(quads[0], BoundingBox::new(0.0, 0.0, 2.0, 2.0)); // lower-left
        assert_eq!(quads[1], BoundingBox::new(2.0, 0.0, 4.0, 2.0)); // lower-right
        assert_eq!(quads[2], BoundingBox::new(0.0, 2.0, 2.0, 4.0)); // upper-left
        assert_eq!(quads[3], BoundingBox::new(2.0, 2.0, 4.0, 4.0)); // upper-right
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(-1.0, 0.5, 0.5, 2.0);
        assert_eq!(a.union(&b), BoundingBox::new(-1.0, 0.0, 1.0, 2.0));
    }

    #[test]
    fn test_region_radians() {
        let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
        let region = bbox.to_region(0.0, 10.0);
        assert!((region[0] + std::f64::consts::PI).abs() < 1e-12);
        assert!((region[3] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(region[4], 0.0);
        assert_eq!(region[5], 10.0);
    }
}
