//! Packed subtree availability files for implicit tiling.
//!
//! The tile tree is cut into fixed-depth windows; each window becomes one
//! binary file holding three bitstreams in Morton order: tile
//! availability, content availability, and child-subtree availability.
//!
//! File layout (little-endian):
//!   00 : [u8;4] magic = b"subt"
//!   04 : u32    version = 1
//!   08 : u64    JSON byte length
//!   10 : u64    binary byte length
//!   18 : JSON block, space-padded to a multiple of 8
//!   .. : binary block, zero-padded to a multiple of 8
//!
//! Bits are packed most-significant-bit-first within each byte. Windows
//! containing no available tile are omitted.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::TreeError;
use crate::tile::{Tile, TileId};

pub const SUBTREE_MAGIC: [u8; 4] = *b"subt";
pub const SUBTREE_VERSION: u32 = 1;

/// A window holds 4^levels child bits, so the depth is capped to keep a
/// single file in the megabyte range.
pub const MAX_SUBTREE_LEVELS: u32 = 10;

/// Morton interleave of a quadtree tile coordinate, x in the even bit
/// positions.
pub fn morton2(x: u32, y: u32) -> u64 {
    let mut m = 0u64;
    for i in 0..32 {
        m |= ((x as u64 >> i) & 1) << (2 * i);
        m |= ((y as u64 >> i) & 1) << (2 * i + 1);
    }
    m
}

/// Offset of the first node of relative level `l` in the flattened
/// window ordering: (4^l - 1) / 3.
fn level_offset(l: u32) -> usize {
    ((4usize.pow(l)) - 1) / 3
}

struct BitVec {
    bits: Vec<bool>,
}

impl BitVec {
    fn zeros(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    fn set(&mut self, i: usize) {
        self.bits[i] = true;
    }

    fn count_ones(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    fn all_ones(&self) -> bool {
        self.bits.iter().all(|b| *b)
    }

    fn all_zeros(&self) -> bool {
        self.count_ones() == 0
    }

    /// MSB-first packing: bit i lands in byte i/8 at position 7 - i%8.
    fn pack(&self) -> Vec<u8> {
        let mut out = vec![0u8; (self.bits.len() + 7) / 8];
        for (i, bit) in self.bits.iter().enumerate() {
            if *bit {
                out[i / 8] |= 1 << (7 - (i % 8));
            }
        }
        out
    }
}

/// Encode availability windows of `levels` levels each for the realized
/// tree. Returns the binary subtree file per window-root coordinate.
pub fn encode_subtrees(
    root: &Tile,
    levels: u32,
) -> Result<BTreeMap<TileId, Vec<u8>>, TreeError> {
    if !(1..=MAX_SUBTREE_LEVELS).contains(&levels) {
        return Err(TreeError::Config(format!(
            "subtree levels must be between 1 and {MAX_SUBTREE_LEVELS}, got {levels}"
        )));
    }

    let mut out = BTreeMap::new();
    let mut queue: Vec<&Tile> = vec![root];

    while let Some(window_root) = queue.pop() {
        if window_root.count_available() == 0 {
            continue;
        }

        let node_count = level_offset(levels);
        let child_count = 4usize.pow(levels);
        let mut tile_bits = BitVec::zeros(node_count);
        let mut content_bits = BitVec::zeros(node_count);
        let mut child_bits = BitVec::zeros(child_count);

        collect_window(
            window_root,
            window_root.id,
            levels,
            &mut tile_bits,
            &mut content_bits,
            &mut child_bits,
            &mut queue,
        );

        out.insert(window_root.id, pack_window(&tile_bits, &content_bits, &child_bits));
    }

    Ok(out)
}

fn collect_window<'t>(
    node: &'t Tile,
    window_root: TileId,
    levels: u32,
    tile_bits: &mut BitVec,
    content_bits: &mut BitVec,
    child_bits: &mut BitVec,
    queue: &mut Vec<&'t Tile>,
) {
    let rel_level = node.id.z - window_root.z;
    let x_local = node.id.x - (window_root.x << rel_level);
    let y_local = node.id.y - (window_root.y << rel_level);
    let morton = morton2(x_local, y_local) as usize;

    if rel_level == levels {
        // Root of the next window down.
        if node.count_available() > 0 {
            child_bits.set(morton);
            queue.push(node);
        }
        return;
    }

    tile_bits.set(level_offset(rel_level) + morton);
    if node.available {
        content_bits.set(level_offset(rel_level) + morton);
    }

    for child in &node.children {
        collect_window(child, window_root, levels, tile_bits, content_bits, child_bits, queue);
    }
}

fn availability_json(
    bits: &BitVec,
    views: &mut Vec<Value>,
    binary: &mut Vec<u8>,
) -> Value {
    if bits.all_zeros() {
        return json!({"constant": 0});
    }
    if bits.all_ones() {
        return json!({"constant": 1});
    }

    // Bitstream views are 8-byte aligned within the binary block.
    while binary.len() % 8 != 0 {
        binary.push(0);
    }
    let packed = bits.pack();
    views.push(json!({
        "buffer": 0,
        "byteOffset": binary.len(),
        "byteLength": packed.len(),
    }));
    binary.extend_from_slice(&packed);

    json!({
        "bitstream": views.len() - 1,
        "availableCount": bits.count_ones(),
    })
}

fn pack_window(tile_bits: &BitVec, content_bits: &BitVec, child_bits: &BitVec) -> Vec<u8> {
    let mut binary: Vec<u8> = Vec::new();
    let mut views: Vec<Value> = Vec::new();

    let tile_availability = availability_json(tile_bits, &mut views, &mut binary);
    let content_availability = availability_json(content_bits, &mut views, &mut binary);
    let child_availability = availability_json(child_bits, &mut views, &mut binary);

    while binary.len() % 8 != 0 {
        binary.push(0);
    }

    let schema = json!({
        "buffers": [{"byteLength": binary.len()}],
        "bufferViews": views,
        "tileAvailability": tile_availability,
        "contentAvailability": [content_availability],
        "childSubtreeAvailability": child_availability,
    });

    let mut json_bytes = serde_json::to_vec(&schema).expect("subtree JSON is serializable");
    while json_bytes.len() % 8 != 0 {
        json_bytes.push(b' ');
    }

    let mut out = Vec::with_capacity(24 + json_bytes.len() + binary.len());
    out.extend_from_slice(&SUBTREE_MAGIC);
    out.extend_from_slice(&SUBTREE_VERSION.to_le_bytes());
    out.extend_from_slice(&(json_bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(&(binary.len() as u64).to_le_bytes());
    out.extend_from_slice(&json_bytes);
    out.extend_from_slice(&binary);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundingBox;

    fn parsed(bytes: &[u8]) -> (Value, Vec<u8>) {
        assert_eq!(&bytes[0..4], b"subt");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);
        let json_len = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
        let bin_len = u64::from_le_bytes(bytes[16..24].try_into().unwrap()) as usize;
        assert_eq!(json_len % 8, 0);
        assert_eq!(bin_len % 8, 0);
        assert_eq!(bytes.len(), 24 + json_len + bin_len);
        let schema: Value = serde_json::from_slice(&bytes[24..24 + json_len]).unwrap();
        (schema, bytes[24 + json_len..].to_vec())
    }

    fn set_bits(bytes: &[u8]) -> usize {
        bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    fn available(id: TileId) -> Tile {
        let mut t = Tile::unavailable(id, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        t.available = true;
        t
    }

    fn root_with_four_children() -> Tile {
        let mut root = available(TileId::ROOT);
        root.children = TileId::ROOT.children().into_iter().map(available).collect();
        root
    }

    #[test]
    fn test_morton_order() {
        assert_eq!(morton2(0, 0), 0);
        assert_eq!(morton2(1, 0), 1);
        assert_eq!(morton2(0, 1), 2);
        assert_eq!(morton2(1, 1), 3);
        assert_eq!(morton2(2, 1), 0b0110);
    }

    #[test]
    fn test_five_available_tiles() {
        let root = root_with_four_children();
        let windows = encode_subtrees(&root, 2).unwrap();
        assert_eq!(windows.len(), 1);

        let (schema, binary) = parsed(&windows[&TileId::ROOT]);

        // Root plus its 4 children: all 5 window nodes visited and with
        // content; the streams collapse to constant 1.
        assert_eq!(schema["tileAvailability"], json!({"constant": 1}));
        assert_eq!(schema["contentAvailability"][0], json!({"constant": 1}));
        // Recursion stopped at depth 1, so no child windows exist.
        assert_eq!(schema["childSubtreeAvailability"], json!({"constant": 0}));
        assert!(binary.is_empty());
    }

    #[test]
    fn test_partial_availability_bit_counts() {
        // Root with content and only the lower-left child realized.
        let mut root = available(TileId::ROOT);
        root.children = vec![available(TileId::new(1, 0, 0))];

        let windows = encode_subtrees(&root, 2).unwrap();
        let (schema, binary) = parsed(&windows[&TileId::ROOT]);

        assert_eq!(schema["tileAvailability"]["availableCount"], json!(2));
        let view_idx = schema["tileAvailability"]["bitstream"].as_u64().unwrap() as usize;
        let view = &schema["bufferViews"][view_idx];
        let off = view["byteOffset"].as_u64().unwrap() as usize;
        let len = view["byteLength"].as_u64().unwrap() as usize;
        let stream = &binary[off..off + len];
        assert_eq!(set_bits(stream), 2);

        // MSB-first: bit 0 (root) and bit 1 (first child, Morton 0).
        assert_eq!(stream[0], 0b1100_0000);
    }

    #[test]
    fn test_empty_windows_omitted() {
        let root = Tile::unavailable(TileId::ROOT, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let windows = encode_subtrees(&root, 2).unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn test_deep_tree_spawns_child_windows() {
        // Content only at depth 2: window 0 references one child window.
        let mut root = Tile::unavailable(TileId::ROOT, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let mut mid = Tile::unavailable(TileId::new(1, 0, 0), BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        mid.children = vec![available(TileId::new(2, 0, 0))];
        root.children = vec![mid];

        let windows = encode_subtrees(&root, 2).unwrap();
        assert_eq!(windows.len(), 2);
        assert!(windows.contains_key(&TileId::new(2, 0, 0)));

        let (schema, binary) = parsed(&windows[&TileId::ROOT]);
        assert_eq!(schema["contentAvailability"][0], json!({"constant": 0}));
        assert_eq!(schema["childSubtreeAvailability"]["availableCount"], json!(1));

        let view_idx =
            schema["childSubtreeAvailability"]["bitstream"].as_u64().unwrap() as usize;
        let view = &schema["bufferViews"][view_idx];
        let off = view["byteOffset"].as_u64().unwrap() as usize;
        let len = view["byteLength"].as_u64().unwrap() as usize;
        assert_eq!(set_bits(&binary[off..off + len]), 1);
    }

    #[test]
    fn test_levels_out_of_range_rejected() {
        let root = root_with_four_children();
        assert!(matches!(
            encode_subtrees(&root, 0),
            Err(TreeError::Config(_))
        ));
        // Depths past the cap would overflow the per-window bit counts.
        assert!(matches!(
            encode_subtrees(&root, 32),
            Err(TreeError::Config(_))
        ));
    }
}
