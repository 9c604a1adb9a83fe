//! Error taxonomy for the core.
//!
//! Geometry rejection (`TooBig`/`TooClose`/`Culled`) is deliberately *not* part
//! of this enum: it's a non-exceptional outcome of a render call (see
//! [`crate::splatter::RenderOutcome`]), not a failure. What lands here is the
//! boundary where externally-supplied bytes or sizes can actually be wrong:
//! loading/packing an octree.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OctreeError {
    #[error("address {address} out of range (store has {len} nodes)")]
    AddressOutOfRange { address: u32, len: usize },

    #[error("record stream length {0} is not a multiple of 8 bytes")]
    TruncatedRecord(usize),

    #[error("empty record stream")]
    EmptyStore,

    #[error("cyclic node graph detected while packing (produced {produced} nodes from {original} source nodes)")]
    CyclicGraph { produced: usize, original: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
