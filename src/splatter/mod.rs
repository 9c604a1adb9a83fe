//! C5: the splatter kernel (§4.5), the one component that turns an
//! instance matrix plus an octree into pixels.

mod setup;
mod shapes;
mod stencil;
mod traversal;

pub use setup::SetupError;
pub use shapes::Shape;

use crate::config::RenderConfig;
use crate::matrix::Mat3x4;
use crate::octree::OctreeStore;
use crate::renderbuffer::Renderbuffer;
use stencil::TraceBuffer;

/// A screen-space rectangle in whole pixels, half-open on neither end
/// (`max_x`/`max_y` are inclusive), empty whenever `min > max` on either axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }
}

/// The outcome of a `render()` call (§4.5.7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Projection exceeds the representable fixed-point range; the caller
    /// may tile/subdivide via the cage subdivider (C6).
    TooBig,
    /// The root's near extent crosses the near plane.
    TooClose,
    /// The clipped screen rectangle is empty.
    Culled,
    /// Completed normally.
    Rendered,
}

/// Per-frame, per-instance scratch plus a borrow of the shared read-only
/// state (renderbuffer, octree, order tables via §4.3's free functions).
/// `begin`/`finish` bracket one instance's scratch lifetime (§6); `render`
/// may be called any number of times between them against the same or
/// different octree addresses sharing that scratch (e.g. a cage subdivider
/// invoking the splatter once per sub-cage).
pub struct Splatter<'a> {
    renderbuffer: &'a mut Renderbuffer,
    config: &'a RenderConfig,
    viewport: Rect,
    trace: TraceBuffer,
}

impl<'a> Splatter<'a> {
    pub fn begin(renderbuffer: &'a mut Renderbuffer, config: &'a RenderConfig, viewport: Rect) -> Self {
        Self {
            renderbuffer,
            config,
            viewport,
            trace: TraceBuffer::new(),
        }
    }

    /// Renders one instance of `octree` rooted at `root_address`, transformed
    /// by `matrix` (object space -> renderbuffer pixel/depth space).
    pub fn render(&mut self, octree: &OctreeStore, root_address: u32, matrix: &Mat3x4) -> RenderOutcome {
        let setup = match setup::setup(matrix, self.config, self.viewport) {
            Ok(setup) => setup,
            Err(SetupError::TooBig) => return RenderOutcome::TooBig,
            Err(SetupError::TooClose) => return RenderOutcome::TooClose,
            Err(SetupError::Culled) => return RenderOutcome::Culled,
        };

        traversal::run(
            self.renderbuffer,
            self.config,
            &setup,
            octree,
            root_address,
            &mut self.trace,
        );
        RenderOutcome::Rendered
    }

    /// Clears this instance's stencil bits via the trace buffer (§4.5.5) and
    /// resets scratch for the next instance.
    pub fn finish(&mut self) {
        self.trace.clear_stencil(self.renderbuffer);
    }
}
