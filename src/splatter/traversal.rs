//! §4.5.3/§4.5.6: the explicit-stack traversal state machine. One iteration
//! pops a frame, decides which of the five cases it falls into from its
//! pixel footprint (`maxSize`) and its node's mask, and either writes pixels
//! directly or pushes its children.

use super::setup::SetupData;
use super::shapes;
use super::stencil::TraceBuffer;
use super::Rect;
use crate::config::RenderConfig;
use crate::fixed::{NODE_STACK_CAPACITY, SUBPIXEL_BITS};
use crate::octree::OctreeStore;
use crate::renderbuffer::Renderbuffer;

#[derive(Clone, Copy)]
struct Frame {
    x: i64,
    y: i64,
    z: i64,
    bounds: Rect,
    level: i32,
    address: u32,
}

pub fn run(
    renderbuffer: &mut Renderbuffer,
    config: &RenderConfig,
    setup: &SetupData,
    octree: &OctreeStore,
    root_address: u32,
    trace: &mut TraceBuffer,
) {
    let mut stack: Vec<Frame> = Vec::with_capacity(NODE_STACK_CAPACITY);
    stack.push(Frame {
        x: setup.tx,
        y: setup.ty,
        z: setup.tz,
        bounds: setup.bounds,
        level: 0,
        address: root_address,
    });

    while let Some(frame) = stack.pop() {
        if frame.bounds.is_empty() {
            continue;
        }
        let node = octree.node(frame.address);
        let mask = node.mask;
        let ext_x = (setup.extent_x >> frame.level).max(1);
        let ext_y = (setup.extent_y >> frame.level).max(1);
        let max_size = (ext_x.max(ext_y) >> SUBPIXEL_BITS) as i32;
        let level_capped = config.max_level >= 0 && frame.level >= config.max_level;

        if max_size < 1 {
            single_pixel(renderbuffer, config, setup, octree, trace, &frame, mask);
            continue;
        }

        if mask == 0 || level_capped {
            let z = frame.z + (setup.extent_z >> frame.level).max(0);
            let center_x = (frame.x >> SUBPIXEL_BITS) as i32;
            let center_y = (frame.y >> SUBPIXEL_BITS) as i32;
            let face_signs = face_signs(setup, frame.level);
            shapes::splat(
                renderbuffer,
                trace,
                setup.shape,
                frame.bounds,
                center_x,
                center_y,
                z,
                node.data,
                255,
                config.stencil,
                face_signs,
            );
            if config.show_bounds {
                shapes::draw_bounds_outline(renderbuffer, frame.bounds, config.bounds_color);
            }
            continue;
        }

        if max_size < config.map_threshold as i32 {
            map_node(renderbuffer, config, setup, octree, trace, &frame, mask, false);
            continue;
        }

        if max_size < config.map_threshold8 as i32 {
            map_node(renderbuffer, config, setup, octree, trace, &frame, mask, true);
            continue;
        }

        general(renderbuffer, setup, octree, &mut stack, &frame, mask);
    }
}

fn face_signs(setup: &SetupData, level: i32) -> (i8, i8, i8) {
    let _ = level;
    let sx = setup.matrix.xz().signum() as i8;
    let sy = setup.matrix.yz().signum() as i8;
    let sz = setup.matrix.zz().signum() as i8;
    (sx, sy, sz)
}

#[allow(clippy::too_many_arguments)]
fn single_pixel(
    renderbuffer: &mut Renderbuffer,
    config: &RenderConfig,
    setup: &SetupData,
    octree: &OctreeStore,
    trace: &mut TraceBuffer,
    frame: &Frame,
    mask: u8,
) {
    let x = (frame.x >> SUBPIXEL_BITS) as i32;
    let y = (frame.y >> SUBPIXEL_BITS) as i32;
    if x < frame.bounds.min_x || x > frame.bounds.max_x || y < frame.bounds.min_y || y > frame.bounds.max_y {
        return;
    }
    if mask == 0 || config.map_threshold > 1 {
        write_pixel(renderbuffer, trace, config, x, y, frame.z, octree.data(frame.address));
        return;
    }
    let mx = setup.octant_map.cell(frame.x - setup.tx);
    let my = setup.octant_map.cell(frame.y - setup.ty);
    let covering = setup.octant_map.mask_at(mx, my, mask);
    if covering == 0 {
        return;
    }
    let mut queue = setup.forward_queue(covering);
    if let Some(octant) = queue.dequeue() {
        if let Some(child) = octree.child_address(frame.address, octant) {
            let z = frame.z + (setup.deltas[octant as usize].2 >> frame.level);
            write_pixel(renderbuffer, trace, config, x, y, z, octree.data(child));
        }
    }
}

/// Cases 3 (small node) and 4 (medium node): per-pixel, pick the nearest
/// octant still covering that pixel and write its child's color. `medium`
/// selects the finer 64-bit sub-octant map (§4.5.3 case 4) over the 1-bit
/// map (case 3) for the covering test.
#[allow(clippy::too_many_arguments)]
fn map_node(
    renderbuffer: &mut Renderbuffer,
    config: &RenderConfig,
    setup: &SetupData,
    octree: &OctreeStore,
    trace: &mut TraceBuffer,
    frame: &Frame,
    mask: u8,
    medium: bool,
) {
    for y in frame.bounds.min_y..=frame.bounds.max_y {
        for x in frame.bounds.min_x..=frame.bounds.max_x {
            let px = (x as i64) << SUBPIXEL_BITS;
            let py = (y as i64) << SUBPIXEL_BITS;
            let mx = setup.octant_map.cell(px - setup.tx);
            let my = setup.octant_map.cell(py - setup.ty);
            let covering = if medium {
                setup.octant_map.mask_at_medium(mx, my, mask)
            } else {
                setup.octant_map.mask_at(mx, my, mask)
            };
            if covering == 0 {
                continue;
            }
            let mut queue = setup.forward_queue(covering);
            if let Some(octant) = queue.dequeue() {
                if let Some(child) = octree.child_address(frame.address, octant) {
                    let z = frame.z + (setup.deltas[octant as usize].2 >> frame.level);
                    write_pixel(renderbuffer, trace, config, x, y, z, octree.data(child));
                }
            }
        }
    }
    if config.show_bounds {
        shapes::draw_bounds_outline(renderbuffer, frame.bounds, config.bounds_color);
    }
}

fn general(
    renderbuffer: &mut Renderbuffer,
    setup: &SetupData,
    octree: &OctreeStore,
    stack: &mut Vec<Frame>,
    frame: &Frame,
    mask: u8,
) {
    // occlusion test: if every depth in the rectangle already rejects this
    // node's nearest possible z, the whole node is invisible.
    let mut all_occluded = true;
    'rows: for y in frame.bounds.min_y..=frame.bounds.max_y {
        for x in frame.bounds.min_x..=frame.bounds.max_x {
            let index = renderbuffer.pixel_index(x as usize, y as usize);
            if renderbuffer.test(index, frame.z) {
                all_occluded = false;
                break 'rows;
            }
        }
    }
    if all_occluded {
        return;
    }

    let mut queue = setup.reverse_queue(mask);
    let child_ext_x = (setup.extent_x >> (frame.level + 1)) + setup.dilation;
    let child_ext_y = (setup.extent_y >> (frame.level + 1)) + setup.dilation;
    while let Some(octant) = queue.dequeue() {
        let Some(child_address) = octree.child_address(frame.address, octant) else {
            continue;
        };
        let (dx, dy, dz) = setup.deltas[octant as usize];
        let shift = frame.level + 1;
        let child_x = frame.x + (dx >> shift);
        let child_y = frame.y + (dy >> shift);
        let child_z = frame.z + (dz >> shift);
        let child_rect = Rect {
            min_x: ((child_x - child_ext_x) >> SUBPIXEL_BITS) as i32,
            min_y: ((child_y - child_ext_y) >> SUBPIXEL_BITS) as i32,
            max_x: ((child_x + child_ext_x) >> SUBPIXEL_BITS) as i32,
            max_y: ((child_y + child_ext_y) >> SUBPIXEL_BITS) as i32,
        }
        .intersect(&frame.bounds);
        if child_rect.is_empty() {
            continue;
        }
        if stack.len() >= NODE_STACK_CAPACITY {
            continue;
        }
        stack.push(Frame {
            x: child_x,
            y: child_y,
            z: child_z,
            bounds: child_rect,
            level: frame.level + 1,
            address: child_address,
        });
    }
}

fn write_pixel(
    renderbuffer: &mut Renderbuffer,
    trace: &mut TraceBuffer,
    config: &RenderConfig,
    x: i32,
    y: i32,
    z: i64,
    color: crate::color::Color24,
) {
    if x < 0 || y < 0 || x as usize >= renderbuffer.size_x() || y as usize >= renderbuffer.size_y() {
        return;
    }
    let index = renderbuffer.pixel_index(x as usize, y as usize);
    let z = z.max(0);
    if renderbuffer.test(index, z) {
        renderbuffer.write(index, z, color, 255, config.stencil);
        if config.stencil {
            trace.record(index);
        }
    }
}
