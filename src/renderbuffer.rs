//! C2: the depth+color+stencil renderbuffer (§3, §4.2).
//!
//! `depth[]` folds the stencil into the sign bit of a signed 32-bit value:
//! bit 31 set means "written this frame". Since a node's projected depth is
//! always non-negative after `TooClose` rejection, `node_z < pixel.depth` is
//! simultaneously the depth test and the "not yet written" test whenever
//! `pixel.depth`'s sign bit is set: exactly the trick §4.5.5 describes.

use crate::color::Color32;
use crate::fixed::FAR_PLANE;

const STENCIL_BIT: i32 = i32::MIN; // sign bit

/// The four sub-pixel jitter offsets cycled through by temporal upscaling
/// (§4.2), indexed by `frame_count % 4`.
const JITTER_PHASES: [(usize, usize); 4] = [(0, 0), (1, 1), (1, 0), (0, 1)];

#[derive(Clone)]
pub struct Renderbuffer {
    /// Output dimensions, as last requested via `resize`.
    output_x: usize,
    output_y: usize,
    /// Working-resolution dimensions the splatter actually renders into,
    /// equal to the output dimensions unless temporal upscaling is enabled,
    /// in which case they are half (rounded up).
    size_x: usize,
    size_y: usize,
    shift: u32,
    depth: Vec<i32>,
    color: Vec<Color32>,
    temporal_upscale: bool,
    frame_count: u64,
    final_color: Vec<Color32>,
}

impl Renderbuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let mut buf = Self {
            output_x: 0,
            output_y: 0,
            size_x: 0,
            size_y: 0,
            shift: 0,
            depth: Vec::new(),
            color: Vec::new(),
            temporal_upscale: false,
            frame_count: 0,
            final_color: Vec::new(),
        };
        buf.resize(width, height);
        buf
    }

    pub fn set_temporal_upscale(&mut self, enabled: bool) {
        if self.temporal_upscale != enabled {
            self.temporal_upscale = enabled;
            let (w, h) = (self.output_x, self.output_y);
            self.resize(w, h);
        }
    }

    /// Reallocates backing storage if dimensions changed; recomputes the
    /// shift-by-constant row stride (§4.2).
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.output_x && height == self.output_y && !self.depth.is_empty() {
            return;
        }
        self.output_x = width;
        self.output_y = height;
        let (working_w, working_h) = if self.temporal_upscale {
            ((width + 1) / 2, (height + 1) / 2)
        } else {
            (width, height)
        };
        self.size_x = working_w;
        self.size_y = working_h;
        self.shift = shift_for(working_w.max(1));
        let stride = 1usize << self.shift;
        let area = stride * working_h.max(1);
        self.depth = vec![FAR_PLANE as i32; area];
        self.color = vec![Color32::default(); area];
        self.final_color = vec![Color32::default(); width * height];
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.size_y
    }

    #[inline]
    pub fn row_stride(&self) -> usize {
        1 << self.shift
    }

    #[inline]
    pub fn pixel_index(&self, x: usize, y: usize) -> usize {
        (y << self.shift) + x
    }

    /// Fills depth with `FAR_PLANE` (stencil clear) and color with `background`.
    pub fn begin(&mut self, background: Color32) {
        self.depth.fill(FAR_PLANE as i32);
        self.color.fill(background);
    }

    #[inline]
    pub fn depth_at(&self, index: usize) -> i32 {
        self.depth[index]
    }

    #[inline]
    pub fn color_at(&self, index: usize) -> Color32 {
        self.color[index]
    }

    /// Depth test, and simultaneously the "not yet written by this instance"
    /// stencil test, per §4.5.5: once a pixel has been written with the
    /// stencil bit set, the stored `i32` is negative, so no further
    /// non-negative `node_z` from the same instance can ever pass: exactly
    /// the self-occlusion behavior front-to-back traversal needs. After
    /// `clear_stencil`, the stored value returns to a plain positive depth
    /// and the comparison degrades to an ordinary cross-instance depth test.
    #[inline]
    pub fn test(&self, index: usize, node_z: i64) -> bool {
        debug_assert!(node_z >= 0);
        node_z < self.depth[index] as i64
    }

    #[inline]
    pub fn write(&mut self, index: usize, node_z: i64, color: crate::color::Color24, alpha: u8, stencil: bool) {
        debug_assert!(node_z >= 0 && node_z < FAR_PLANE);
        self.depth[index] = if stencil {
            (node_z as i32) | STENCIL_BIT
        } else {
            node_z as i32
        };
        self.color[index].write_rgb(color);
        self.color[index].a = alpha;
    }

    /// Overwrites a pixel's color only, bypassing the depth/stencil test
    /// entirely. Used for the debug bounds-wireframe overlay (§6), which
    /// draws on top of whatever a node's splat already wrote rather than
    /// competing with it for the depth test.
    #[inline]
    pub fn overlay_rgb(&mut self, index: usize, color: crate::color::Color24) {
        self.color[index].write_rgb(color);
    }

    /// Clears the stencil bit (only) at the given indices: the trace-buffer
    /// driven clear of §4.5.5, avoiding a full-screen clear between instances.
    pub fn clear_stencil(&mut self, indices: &[usize]) {
        for &i in indices {
            self.depth[i] &= !STENCIL_BIT;
        }
    }

    pub fn depth_slice(&self) -> &[i32] {
        &self.depth
    }

    /// Downsamples/temporally-upscales the working buffer into the final
    /// output buffer, then returns the output color buffer (§4.2).
    ///
    /// With temporal upscaling disabled this is a straight copy. With it
    /// enabled, only a quarter of the output pixels are refreshed this
    /// frame (the ones landing on `frame_count % 4`'s jitter phase), and the
    /// rest retain whatever the previous three frames wrote.
    pub fn end(&mut self) -> &[Color32] {
        if !self.temporal_upscale {
            let stride = self.row_stride();
            for y in 0..self.size_y {
                let src_row = &self.color[y * stride..y * stride + self.size_x];
                let dst_row = &mut self.final_color[y * self.output_x..(y + 1) * self.output_x];
                dst_row.copy_from_slice(src_row);
            }
            self.frame_count = self.frame_count.wrapping_add(1);
            return &self.final_color;
        }

        let (phase_x, phase_y) = JITTER_PHASES[(self.frame_count % 4) as usize];
        for y in 0..self.size_y {
            let out_y = y * 2 + phase_y;
            if out_y >= self.output_y {
                continue;
            }
            for x in 0..self.size_x {
                let out_x = x * 2 + phase_x;
                if out_x >= self.output_x {
                    continue;
                }
                let src = self.pixel_index(x, y);
                self.final_color[out_y * self.output_x + out_x] = self.color[src];
            }
        }
        self.frame_count = self.frame_count.wrapping_add(1);
        &self.final_color
    }
}

fn shift_for(size: usize) -> u32 {
    let mut shift = 0u32;
    while (1usize << shift) < size {
        shift += 1;
    }
    shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_clears_depth_and_color() {
        let mut rb = Renderbuffer::new(4, 4);
        let bg = Color32::new(1, 2, 3, 4);
        rb.begin(bg);
        for i in 0..rb.depth_slice().len() {
            assert_eq!(rb.depth_at(i), FAR_PLANE as i32);
            assert_eq!(rb.color_at(i), bg);
        }
    }

    #[test]
    fn stencil_write_blocks_any_further_write_by_the_same_instance() {
        let mut rb = Renderbuffer::new(2, 2);
        rb.begin(Color32::default());
        let idx = rb.pixel_index(0, 0);
        assert!(rb.test(idx, 100));
        rb.write(idx, 100, crate::color::Color24::new(9, 9, 9), 255, true);
        // front-to-back traversal means any later hit from this instance is farther,
        // but even a (hypothetically) nearer depth must not re-pass the test.
        assert!(!rb.test(idx, 200));
        assert!(!rb.test(idx, 50));
    }

    #[test]
    fn clear_stencil_reopens_pixel_for_the_next_instance() {
        let mut rb = Renderbuffer::new(2, 2);
        rb.begin(Color32::default());
        let idx = rb.pixel_index(0, 0);
        rb.write(idx, 100, crate::color::Color24::new(1, 1, 1), 255, true);
        assert!(!rb.test(idx, 150));
        rb.clear_stencil(&[idx]);
        assert!(!rb.test(idx, 150)); // depth (100) still blocks a farther hit from instance 2
        assert!(rb.test(idx, 50)); // but a closer hit from instance 2 passes
    }

    #[test]
    fn row_stride_is_power_of_two() {
        let rb = Renderbuffer::new(5, 3);
        assert_eq!(rb.row_stride(), 8);
    }
}
