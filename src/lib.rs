//! CPU-only front-to-back octree splatting renderer core.
//!
//! Splats sparse voxel octrees (C1) straight to a depth+color renderbuffer
//! (C2) via fixed-point projection and explicit-stack traversal (C5), using
//! precomputed per-instance octant order (C3) and octant map (C4) tables,
//! falling back to recursive cage subdivision (C6) for instances a single
//! linear matrix can't project. C7 drives a whole scene's worth of instances
//! through the above per frame.
//!
//! No rasterization backend, windowing, or GPU path lives here: this crate
//! produces a color buffer and nothing else and leaves presenting it to the
//! caller.

pub mod cage;
pub mod color;
pub mod config;
pub mod error;
pub mod fixed;
pub mod matrix;
pub mod octant_map;
pub mod octree;
pub mod order;
pub mod renderbuffer;
pub mod scene;
pub mod splatter;
pub mod vector;

pub use color::{Color24, Color32};
pub use config::RenderConfig;
pub use error::OctreeError;
pub use matrix::{Mat3, Mat3x4};
pub use octree::{ChildLayout, Node, OctreeStore};
pub use renderbuffer::Renderbuffer;
pub use scene::{Instance, Scene};
pub use splatter::{RenderOutcome, Shape, Splatter};
pub use vector::V3c;
