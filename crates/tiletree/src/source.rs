use tilemesh::{AttributeTable, GeometryRecord};

use crate::bbox::BoundingBox;
use crate::error::TreeError;

/// Features of one tile: geometry records in batch order plus their
/// attribute columns (row `i` belongs to record `i`).
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub records: Vec<GeometryRecord>,
    pub attributes: AttributeTable,
}

/// External geometry collaborator. Implementations own their connection
/// or in-memory state; the tiler only asks for counts and features per
/// bounding box, optionally restricted to one detail level.
pub trait GeometrySource: Sync {
    fn feature_count(&self, bbox: &BoundingBox, lod: Option<i64>) -> Result<u64, TreeError>;

    fn load_features(&self, bbox: &BoundingBox, lod: Option<i64>) -> Result<FeatureSet, TreeError>;
}
