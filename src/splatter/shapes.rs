//! §4.5.3 case 2: how a leaf (or a node hitting the depth cap) actually
//! puts pixels on the screen, once traversal has decided it is done
//! subdividing and is splatting a single flat color into `bounds`.

use super::stencil::TraceBuffer;
use super::Rect;
use crate::color::Color24;
use crate::renderbuffer::Renderbuffer;

/// The splat footprint a leaf draws with, selected once per instance (§6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Point,
    #[default]
    Rectangle,
    Square,
    Circle,
    /// Approximates a cube's silhouette with an analytic 3-visible-face
    /// clip: each axis contributes a diagonal half-plane cut (rather than a
    /// lookup per sub-octant), producing the same hexagonal outline for the
    /// common case of three faces visible, at the cost of exactness on
    /// grazing/edge-on orientations.
    Cube,
}

#[allow(clippy::too_many_arguments)]
pub fn splat(
    renderbuffer: &mut Renderbuffer,
    trace: &mut TraceBuffer,
    shape: Shape,
    bounds: Rect,
    center_x: i32,
    center_y: i32,
    z: i64,
    color: Color24,
    alpha: u8,
    stencil: bool,
    face_signs: (i8, i8, i8),
) {
    match shape {
        Shape::Point => splat_point(renderbuffer, trace, bounds, center_x, center_y, z, color, alpha, stencil),
        Shape::Rectangle | Shape::Square => {
            splat_rect(renderbuffer, trace, bounds, z, color, alpha, stencil)
        }
        Shape::Circle => splat_circle(renderbuffer, trace, bounds, center_x, center_y, z, color, alpha, stencil),
        Shape::Cube => splat_cube(renderbuffer, trace, bounds, center_x, center_y, z, color, alpha, stencil, face_signs),
    }
}

#[allow(clippy::too_many_arguments)]
fn write_if_visible(
    renderbuffer: &mut Renderbuffer,
    trace: &mut TraceBuffer,
    x: i32,
    y: i32,
    z: i64,
    color: Color24,
    alpha: u8,
    stencil: bool,
) {
    if x < 0 || y < 0 {
        return;
    }
    if x as usize >= renderbuffer.size_x() || y as usize >= renderbuffer.size_y() {
        return;
    }
    let index = renderbuffer.pixel_index(x as usize, y as usize);
    if renderbuffer.test(index, z) {
        renderbuffer.write(index, z, color, alpha, stencil);
        if stencil {
            trace.record(index);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn splat_point(
    renderbuffer: &mut Renderbuffer,
    trace: &mut TraceBuffer,
    bounds: Rect,
    center_x: i32,
    center_y: i32,
    z: i64,
    color: Color24,
    alpha: u8,
    stencil: bool,
) {
    let x = center_x.clamp(bounds.min_x, bounds.max_x);
    let y = center_y.clamp(bounds.min_y, bounds.max_y);
    write_if_visible(renderbuffer, trace, x, y, z, color, alpha, stencil);
}

#[allow(clippy::too_many_arguments)]
fn splat_rect(
    renderbuffer: &mut Renderbuffer,
    trace: &mut TraceBuffer,
    bounds: Rect,
    z: i64,
    color: Color24,
    alpha: u8,
    stencil: bool,
) {
    if bounds.is_empty() {
        return;
    }
    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            write_if_visible(renderbuffer, trace, x, y, z, color, alpha, stencil);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn splat_circle(
    renderbuffer: &mut Renderbuffer,
    trace: &mut TraceBuffer,
    bounds: Rect,
    center_x: i32,
    center_y: i32,
    z: i64,
    color: Color24,
    alpha: u8,
    stencil: bool,
) {
    if bounds.is_empty() {
        return;
    }
    let radius = ((bounds.max_x - bounds.min_x).max(bounds.max_y - bounds.min_y) / 2).max(1);
    let radius_sq = (radius as i64) * (radius as i64);
    for y in bounds.min_y..=bounds.max_y {
        let dy = (y - center_y) as i64;
        let dy_sq = dy * dy;
        if dy_sq > radius_sq {
            continue;
        }
        // incremental squared-distance fill: only the row's half-width changes
        let half_w = isqrt(radius_sq - dy_sq) as i32;
        let row_min = (center_x - half_w).max(bounds.min_x);
        let row_max = (center_x + half_w).min(bounds.max_x);
        for x in row_min..=row_max {
            write_if_visible(renderbuffer, trace, x, y, z, color, alpha, stencil);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn splat_cube(
    renderbuffer: &mut Renderbuffer,
    trace: &mut TraceBuffer,
    bounds: Rect,
    center_x: i32,
    center_y: i32,
    z: i64,
    color: Color24,
    alpha: u8,
    stencil: bool,
    face_signs: (i8, i8, i8),
) {
    if bounds.is_empty() {
        return;
    }
    let (sx, sy, _sz) = face_signs;
    let half_w = ((bounds.max_x - bounds.min_x) / 2).max(1);
    let half_h = ((bounds.max_y - bounds.min_y) / 2).max(1);
    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            let dx = (x - center_x) as f32 / half_w as f32;
            let dy = (y - center_y) as f32 / half_h as f32;
            // a diagonal cut per visible X/Y face pair turns the square
            // silhouette into a hexagon; a flat (sign == 0) axis leaves that
            // cut out, degrading gracefully toward the Square footprint.
            let cut = sx as f32 * dx + sy as f32 * dy;
            if cut.abs() <= 1.5 {
                write_if_visible(renderbuffer, trace, x, y, z, color, alpha, stencil);
            }
        }
    }
}

/// Draws the perimeter of `bounds` in `color` (§6 `ShowBounds`), overlaid on
/// top of whatever the node's own splat already wrote rather than depth-
/// tested against it: a debug aid, not part of the visible scene.
pub fn draw_bounds_outline(renderbuffer: &mut Renderbuffer, bounds: Rect, color: Color24) {
    if bounds.is_empty() {
        return;
    }
    let size_x = renderbuffer.size_x() as i32;
    let size_y = renderbuffer.size_y() as i32;
    let mut put = |x: i32, y: i32| {
        if x < 0 || y < 0 || x >= size_x || y >= size_y {
            return;
        }
        let index = renderbuffer.pixel_index(x as usize, y as usize);
        renderbuffer.overlay_rgb(index, color);
    };
    for x in bounds.min_x..=bounds.max_x {
        put(x, bounds.min_y);
        put(x, bounds.max_y);
    }
    for y in bounds.min_y..=bounds.max_y {
        put(bounds.min_x, y);
        put(bounds.max_x, y);
    }
}

fn isqrt(value: i64) -> i64 {
    if value <= 0 {
        return 0;
    }
    let mut x = (value as f64).sqrt() as i64;
    while x * x > value {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= value {
        x += 1;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color32;

    fn new_buffer(size: usize) -> Renderbuffer {
        let mut rb = Renderbuffer::new(size, size);
        rb.begin(Color32::default());
        rb
    }

    #[test]
    fn rectangle_fills_every_pixel_in_bounds() {
        let mut rb = new_buffer(8);
        let mut trace = TraceBuffer::new();
        let bounds = Rect {
            min_x: 2,
            min_y: 2,
            max_x: 4,
            max_y: 4,
        };
        splat(&mut rb, &mut trace, Shape::Rectangle, bounds, 3, 3, 100, Color24::new(1, 2, 3), 255, false, (0, 0, 0));
        for y in 2..=4 {
            for x in 2..=4 {
                let idx = rb.pixel_index(x, y);
                assert_eq!(rb.color_at(idx), Color32::new(1, 2, 3, 255));
            }
        }
        assert_eq!(rb.color_at(rb.pixel_index(0, 0)), Color32::default());
    }

    #[test]
    fn circle_leaves_corners_of_its_bounding_box_untouched() {
        let mut rb = new_buffer(16);
        let mut trace = TraceBuffer::new();
        let bounds = Rect {
            min_x: 0,
            min_y: 0,
            max_x: 15,
            max_y: 15,
        };
        splat(&mut rb, &mut trace, Shape::Circle, bounds, 7, 7, 100, Color24::new(9, 9, 9), 255, false, (0, 0, 0));
        assert_eq!(rb.color_at(rb.pixel_index(0, 0)), Color32::default());
        assert_eq!(rb.color_at(rb.pixel_index(7, 7)), Color32::new(9, 9, 9, 255));
    }

    #[test]
    fn point_writes_a_single_pixel() {
        let mut rb = new_buffer(8);
        let mut trace = TraceBuffer::new();
        let bounds = Rect {
            min_x: 1,
            min_y: 1,
            max_x: 5,
            max_y: 5,
        };
        splat(&mut rb, &mut trace, Shape::Point, bounds, 3, 3, 100, Color24::new(5, 5, 5), 255, false, (0, 0, 0));
        let mut touched = 0;
        for y in 0..8 {
            for x in 0..8 {
                if rb.color_at(rb.pixel_index(x, y)) != Color32::default() {
                    touched += 1;
                }
            }
        }
        assert_eq!(touched, 1);
    }
}
