use glam::DVec3;

use crate::shader::ShaderColors;

/// Closed ring of vertices. The last point repeats the first; a triangle
/// is therefore a ring of 4 points.
pub type Ring = Vec<DVec3>;

/// Planar polygon with an exterior ring and zero or more interior rings
/// (holes).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub interiors: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring) -> Self {
        Self {
            exterior,
            interiors: Vec::new(),
        }
    }

    pub fn with_holes(exterior: Ring, interiors: Vec<Ring>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// A ring of exactly 4 points with no holes is already a triangle.
    pub fn is_triangle(&self) -> bool {
        self.exterior.len() == 4 && self.interiors.is_empty()
    }
}

/// The supported source geometry kinds, one triangulation strategy per
/// variant. Anything the upstream source can hand us must be mapped onto
/// one of these before processing.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
    LineString(Vec<DVec3>),
    MultiLineString(Vec<Vec<DVec3>>),
    PolyhedralSurface(Vec<Polygon>),
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::PolyhedralSurface(_) => "PolyhedralSurface",
        }
    }

    /// Multi kinds carry a list of sub-geometries, even a list of one.
    pub fn is_multi(&self) -> bool {
        matches!(
            self,
            Geometry::MultiPolygon(_)
                | Geometry::MultiLineString(_)
                | Geometry::PolyhedralSurface(_)
        )
    }

    /// Number of sub-geometries for the multi kinds, 1 otherwise.
    pub fn sub_count(&self) -> usize {
        match self {
            Geometry::MultiPolygon(polys) | Geometry::PolyhedralSurface(polys) => polys.len(),
            Geometry::MultiLineString(lines) => lines.len(),
            Geometry::Polygon(_) | Geometry::LineString(_) => 1,
        }
    }
}

/// One source feature: geometry plus the per-feature metadata the
/// processing pass needs. Consumed by triangulation and discarded.
#[derive(Debug, Clone)]
pub struct GeometryRecord {
    pub batch_id: u32,
    pub geometry: Geometry,
    pub shader: Option<ShaderColors>,
    /// Tube radius for line geometries, meters.
    pub radius: Option<f64>,
}

impl GeometryRecord {
    pub fn new(batch_id: u32, geometry: Geometry) -> Self {
        Self {
            batch_id,
            geometry,
            shader: None,
            radius: None,
        }
    }
}
