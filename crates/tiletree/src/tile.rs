use crate::bbox::BoundingBox;

/// Quadtree address: depth `z`, column `x`, row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    pub const ROOT: TileId = TileId { z: 0, x: 0, y: 0 };

    /// Children in quadrant order: lower-left, lower-right, upper-left,
    /// upper-right.
    pub fn children(&self) -> [TileId; 4] {
        let (z, x, y) = (self.z + 1, self.x * 2, self.y * 2);
        [
            TileId::new(z, x, y),
            TileId::new(z, x + 1, y),
            TileId::new(z, x, y + 1),
            TileId::new(z, x + 1, y + 1),
        ]
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}_{}", self.z, self.x, self.y)
    }
}

/// One realized quadtree node. Built bottom-up by the tiler: children are
/// resolved before the parent assembles them, and a node is never mutated
/// after it is returned.
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    pub bbox: BoundingBox,
    /// True iff the node holds written content.
    pub available: bool,
    /// Content file name relative to the content directory.
    pub content: Option<String>,
    pub children: Vec<Tile>,
}

impl Tile {
    pub fn unavailable(id: TileId, bbox: BoundingBox) -> Self {
        Self {
            id,
            bbox,
            available: false,
            content: None,
            children: Vec::new(),
        }
    }

    /// Depth of the deepest node, root being 0.
    pub fn max_depth(&self) -> u32 {
        self.children
            .iter()
            .map(Tile::max_depth)
            .max()
            .unwrap_or(self.id.z)
    }

    pub fn count_available(&self) -> usize {
        let own = usize::from(self.available);
        own + self.children.iter().map(Tile::count_available).sum::<usize>()
    }

    /// Pre-order traversal over all realized nodes.
    pub fn visit(&self, f: &mut impl FnMut(&Tile)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    pub fn find(&self, id: TileId) -> Option<&Tile> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Union of the bounding boxes of all available descendants (and
    /// self), or `None` when the subtree holds no content.
    pub fn available_extent(&self) -> Option<BoundingBox> {
        let mut extent: Option<BoundingBox> = self.available.then_some(self.bbox);
        for child in &self.children {
            if let Some(child_extent) = child.available_extent() {
                extent = Some(match extent {
                    Some(e) => e.union(&child_extent),
                    None => child_extent,
                });
            }
        }
        extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_id_display() {
        assert_eq!(TileId::new(2, 3, 1).to_string(), "2_3_1");
    }

    #[test]
    fn test_children_addressing() {
        let kids = TileId::new(1, 1, 0).children();
        assert_eq!(kids[0], TileId::new(2, 2, 0));
        assert_eq!(kids[1], TileId::new(2, 3, 0));
        assert_eq!(kids[2], TileId::new(2, 2, 1));
        assert_eq!(kids[3], TileId::new(2, 3, 1));
    }

    #[test]
    fn test_available_extent_unions_leaves() {
        let bbox = BoundingBox::new(0.0, 0.0, 4.0, 4.0);
        let mut root = Tile::unavailable(TileId::ROOT, bbox);
        let quads = bbox.split();
        let mut ll = Tile::unavailable(TileId::new(1, 0, 0), quads[0]);
        ll.available = true;
        let mut ur = Tile::unavailable(TileId::new(1, 1, 1), quads[3]);
        ur.available = true;
        root.children = vec![ll, ur];

        assert_eq!(root.available_extent(), Some(bbox));
        assert_eq!(root.count_available(), 2);
        assert_eq!(root.max_depth(), 1);
    }
}
