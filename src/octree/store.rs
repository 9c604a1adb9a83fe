//! C1: the immutable packed node array (§4.1).

use super::node::{popcount, rank_in_mask, Node};
use crate::error::OctreeError;

/// Whether a node's children occupy 8 contiguous slots (one per octant,
/// `NoChildren` octants simply unused) or `popcount(mask)` contiguous slots
/// (only present octants stored, looked up by rank).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildLayout {
    Sparse,
    Packed,
}

/// An immutable octree: a flat `Vec<Node>` plus the layout mode that tells
/// the splatter how to turn `(address, octant)` into a child index.
///
/// This store never mutates after construction (insertion/editing is
/// explicitly out of scope, §1), so there is no free-list-backed pool here:
/// a plain `Vec` is the right fit for a write-once, read-many array.
#[derive(Clone, Debug)]
pub struct OctreeStore {
    nodes: Vec<Node>,
    layout: ChildLayout,
    root: u32,
}

impl OctreeStore {
    /// Builds a store, validating that every internal node's child span
    /// (`address .. address + childCount`) actually fits inside `nodes`: the
    /// one structural invariant that can't be enforced by construction alone
    /// once nodes arrive from outside the crate (e.g. via [`format::read_from`]).
    pub fn new(nodes: Vec<Node>, layout: ChildLayout) -> Result<Self, OctreeError> {
        if nodes.is_empty() {
            return Err(OctreeError::EmptyStore);
        }
        let len = nodes.len();
        for node in &nodes {
            if node.mask == 0 {
                continue;
            }
            let span = match layout {
                // only the slots up to the highest present octant are ever
                // addressed; earlier octants' absence is not a span bound.
                ChildLayout::Sparse => (7 - node.mask.leading_zeros()) as u64 + 1,
                ChildLayout::Packed => popcount(node.mask) as u64,
            };
            if node.address as u64 + span > len as u64 {
                return Err(OctreeError::AddressOutOfRange {
                    address: node.address,
                    len,
                });
            }
        }
        Ok(Self {
            nodes,
            layout,
            root: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn layout(&self) -> ChildLayout {
        self.layout
    }

    pub fn root_address(&self) -> u32 {
        self.root
    }

    #[inline]
    pub fn node(&self, address: u32) -> &Node {
        debug_assert!((address as usize) < self.nodes.len());
        &self.nodes[address as usize]
    }

    #[inline]
    pub fn mask(&self, address: u32) -> u8 {
        self.node(address).mask
    }

    #[inline]
    pub fn addr(&self, address: u32) -> u32 {
        self.node(address).address
    }

    #[inline]
    pub fn data(&self, address: u32) -> crate::color::Color24 {
        self.node(address).data
    }

    /// Address of `octant`'s child of the node at `address`, if present.
    #[inline]
    pub fn child_address(&self, address: u32, octant: u8) -> Option<u32> {
        let node = self.node(address);
        if !node.has_octant(octant) {
            return None;
        }
        let offset = match self.layout {
            ChildLayout::Sparse => octant as u32,
            ChildLayout::Packed => rank_in_mask(node.mask, octant),
        };
        Some(node.address + offset)
    }

    /// Compacts a sparse source array into a packed graph that stores only
    /// existing children, in depth-first order.
    ///
    /// Count-bounded cycle guard (§4.1, §9): if packing would ever produce
    /// more nodes than the source array holds, the input must contain a
    /// cycle, so packing aborts and the caller gets a root with `mask == 0`
    /// wrapped in an error rather than an unbounded walk.
    pub fn pack(&self) -> Result<OctreeStore, OctreeError> {
        let original_len = self.nodes.len();
        let mut packed = Vec::with_capacity(original_len);
        packed.push(Node::default()); // placeholder for the root, fixed up below

        // (source_address, packed_index) pairs awaiting their children to be written.
        let mut pending = vec![(self.root, 0usize)];
        while let Some((src_address, dst_index)) = pending.pop() {
            if packed.len() > original_len {
                log::warn!(
                    "octree pack: cycle detected, produced {} nodes from {} source nodes",
                    packed.len(),
                    original_len
                );
                packed[0] = Node::default();
                return Err(OctreeError::CyclicGraph {
                    produced: packed.len(),
                    original: original_len,
                });
            }

            let src = self.node(src_address);
            if src.is_leaf() {
                packed[dst_index] = Node::leaf(src.data);
                continue;
            }

            let first_child = packed.len() as u32;
            let mut child_src_addresses = Vec::with_capacity(popcount(src.mask) as usize);
            for octant in 0..8u8 {
                if let Some(child) = self.child_address(src_address, octant) {
                    child_src_addresses.push(child);
                }
            }
            for _ in &child_src_addresses {
                packed.push(Node::default());
            }
            packed[dst_index] = Node::internal(first_child, src.mask);
            for (i, child_src) in child_src_addresses.into_iter().enumerate() {
                pending.push((child_src, first_child as usize + i));
            }
        }

        OctreeStore::new(packed, ChildLayout::Packed)
    }
}
