//! C6: the cage subdivider (§4.6), slicing a deformed 8-vertex cage into a
//! 3x3x3 grid of near-parallelepiped sub-cages by trilinear midpoint
//! insertion, recursing into whichever sub-cages a callback still wants
//! subdivided. Used when the splatter reports `TooBig`/`TooClose` on a
//! cage too skewed or too close for a single linear matrix to project.
//!
//! Implemented with an explicit stack of grids rather than true recursion,
//! the same bounded-depth, inspectable-stack style used elsewhere in this
//! crate (the octree packer, the splatter's node stack) instead of the host
//! language's call stack.

use crate::order::{self, Order};
use crate::vector::V3c;

/// Maximum recursion depth (§4.6, §9): deeper than any useful cage split.
pub const MAX_DEPTH: u32 = 128;

/// The eight corners of a cage, indexed like an octant mask (bit k = corner k).
pub type Cage = [V3c<f32>; 8];

/// `ZSlope == 0` selects an orthographic projection (`scale` is constant);
/// otherwise `scale = 1 / (z_intercept + z_slope * z)`.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub z_intercept: f32,
    pub z_slope: f32,
}

impl Projection {
    pub fn orthographic(scale: f32) -> Self {
        Self {
            z_intercept: 1.0 / scale,
            z_slope: 0.0,
        }
    }

    #[inline]
    pub fn scale_at(&self, z: f32) -> f32 {
        1.0 / (self.z_intercept + self.z_slope * z)
    }
}

/// Builds the 3x3x3 midpoint grid for one subdivision level: 27 points
/// indexed `[gx][gy][gz]`, `gx/gy/gz in 0..3`, where the even indices are
/// the original cage corners and the odd index is the trilinear midpoint.
fn build_grid(cage: &Cage) -> [[[V3c<f32>; 3]; 3]; 3] {
    let corner = |bits: usize| cage[bits];
    let mut grid = [[[V3c::new(0.0, 0.0, 0.0); 3]; 3]; 3];
    for gx in [0usize, 2] {
        for gy in [0usize, 2] {
            for gz in [0usize, 2] {
                let idx = (gx / 2) | ((gy / 2) << 1) | ((gz / 2) << 2);
                grid[gx][gy][gz] = corner(idx);
            }
        }
    }
    // fill edge/face/center midpoints by averaging the already-placed
    // corners that straddle them (trilinear midpoint insertion).
    for gx in 0..3usize {
        for gy in 0..3usize {
            for gz in 0..3usize {
                if gx % 2 == 0 && gy % 2 == 0 && gz % 2 == 0 {
                    continue;
                }
                let lo_x = if gx == 1 { 0 } else { gx };
                let hi_x = if gx == 1 { 2 } else { gx };
                let lo_y = if gy == 1 { 0 } else { gy };
                let hi_y = if gy == 1 { 2 } else { gy };
                let lo_z = if gz == 1 { 0 } else { gz };
                let hi_z = if gz == 1 { 2 } else { gz };
                let mut sum = V3c::new(0.0, 0.0, 0.0);
                let mut n = 0.0f32;
                for x in [lo_x, hi_x] {
                    for y in [lo_y, hi_y] {
                        for z in [lo_z, hi_z] {
                            if x % 2 == 0 && y % 2 == 0 && z % 2 == 0 {
                                let idx = (x / 2) | ((y / 2) << 1) | ((z / 2) << 2);
                                sum = sum + corner(idx);
                                n += 1.0;
                            }
                        }
                    }
                }
                grid[gx][gy][gz] = sum / n;
            }
        }
    }
    grid
}

/// Extracts the sub-cage occupying octant `o` (corners `[gx,gx+1] x [gy,gy+1]
/// x [gz,gz+1]` of the 3x3x3 grid, `gx/gy/gz` the octant's sign bits).
fn sub_cage(grid: &[[[V3c<f32>; 3]; 3]; 3], octant: u8) -> Cage {
    let gx = (octant & 1) as usize;
    let gy = ((octant >> 1) & 1) as usize;
    let gz = ((octant >> 2) & 1) as usize;
    let mut out = [V3c::new(0.0, 0.0, 0.0); 8];
    for sub in 0..8u8 {
        let sx = gx + (sub & 1) as usize;
        let sy = gy + ((sub >> 1) & 1) as usize;
        let sz = gz + ((sub >> 2) & 1) as usize;
        out[sub as usize] = grid[sx][sy][sz];
    }
    out
}

/// The starting octant for a sub-cage: the sign of a triple product of the
/// three center-adjacent edges (orthographic), or of those edges against
/// the eye-minus-center vector (perspective): the same handedness test
/// §4.3's `starting_octant_for` performs on a rigid basis, generalized to a
/// (possibly sheared) cage's local edges.
fn starting_octant(cage: &Cage, eye: Option<V3c<f32>>) -> u8 {
    let center = cage.iter().fold(V3c::new(0.0, 0.0, 0.0), |a, &b| a + b) / 8.0;
    let edge_x = cage[1] - cage[0];
    let edge_y = cage[2] - cage[0];
    let edge_z = cage[4] - cage[0];
    let view = match eye {
        Some(eye) => eye - center,
        None => V3c::new(0.0, 0.0, 1.0),
    };
    let bit_x = (edge_y.cross(edge_z).dot(&view) > 0.0) as u8;
    let bit_y = (edge_z.cross(edge_x).dot(&view) > 0.0) as u8;
    let bit_z = (edge_x.cross(edge_y).dot(&view) > 0.0) as u8;
    bit_x | (bit_y << 1) | (bit_z << 2)
}

/// One pending sub-cage awaiting a callback decision.
struct PendingCage {
    cage: Cage,
    depth: u32,
}

/// Walks `cage`, invoking `on_subcage` for every sub-cage the recursion
/// visits. `on_subcage` returns a bitmask of octants (within the sub-cage it
/// was just given) that still need further subdivision; when that mask is
/// nonzero and `depth < MAX_DEPTH`, those octants are split again.
pub fn subdivide(cage: Cage, eye: Option<V3c<f32>>, mut on_subcage: impl FnMut(&Cage, u32) -> u8) {
    let mut stack = vec![PendingCage { cage, depth: 0 }];
    while let Some(pending) = stack.pop() {
        if pending.depth >= MAX_DEPTH {
            continue;
        }
        let start = starting_octant(&pending.cage, eye);
        let grid = build_grid(&pending.cage);
        let mut queue = order::queue_for(Order::Xyz, start, 0xFF);
        while let Some(octant) = queue.dequeue() {
            let sub = sub_cage(&grid, octant);
            let needs_more = on_subcage(&sub, pending.depth + 1);
            if needs_more != 0 {
                stack.push(PendingCage {
                    cage: sub,
                    depth: pending.depth + 1,
                });
            }
        }
    }
}

/// Projects a cage's 8 corners to screen-space `(x, y)` pairs given a
/// (possibly perspective) `Projection` and a camera-space `z` per corner
/// supplied by `z_of`.
pub fn project_cage(cage: &Cage, projection: &Projection, z_of: impl Fn(V3c<f32>) -> f32) -> [(f32, f32); 8] {
    let mut out = [(0.0f32, 0.0f32); 8];
    for (i, &v) in cage.iter().enumerate() {
        let z = z_of(v);
        let scale = projection.scale_at(z);
        out[i] = (v.x * scale, v.y * scale);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Cage {
        let mut cage = [V3c::new(0.0, 0.0, 0.0); 8];
        for (o, slot) in cage.iter_mut().enumerate() {
            let sx = if o & 1 != 0 { 1.0 } else { -1.0 };
            let sy = if o & 2 != 0 { 1.0 } else { -1.0 };
            let sz = if o & 4 != 0 { 1.0 } else { -1.0 };
            *slot = V3c::new(sx, sy, sz);
        }
        cage
    }

    #[test]
    fn grid_corners_match_original_cage_corners() {
        let cage = unit_cube();
        let grid = build_grid(&cage);
        for o in 0..8u8 {
            let gx = (o & 1) as usize * 2;
            let gy = ((o >> 1) & 1) as usize * 2;
            let gz = ((o >> 2) & 1) as usize * 2;
            assert_eq!(grid[gx][gy][gz], cage[o as usize]);
        }
    }

    #[test]
    fn center_midpoint_is_the_cage_centroid() {
        let cage = unit_cube();
        let grid = build_grid(&cage);
        assert_eq!(grid[1][1][1], V3c::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn sub_cage_octant_zero_is_the_near_negative_corner_eighth() {
        let cage = unit_cube();
        let grid = build_grid(&cage);
        let sub = sub_cage(&grid, 0);
        // its own "far corner" (octant 7 of the sub-cage) is the cage centroid
        assert_eq!(sub[7], V3c::new(0.0, 0.0, 0.0));
        // its own "near corner" (octant 0) is the original cage's octant-0 corner
        assert_eq!(sub[0], cage[0]);
    }

    #[test]
    fn subdivide_visits_every_first_level_octant_exactly_once() {
        let cage = unit_cube();
        let mut visited = 0;
        subdivide(cage, None, |_sub, depth| {
            visited += 1;
            assert_eq!(depth, 1);
            0 // no further subdivision
        });
        assert_eq!(visited, 8);
    }

    #[test]
    fn subdivide_recurses_when_the_callback_asks_for_more() {
        let cage = unit_cube();
        let mut total_visits = 0;
        let mut first_level_done = false;
        subdivide(cage, None, |_sub, depth| {
            total_visits += 1;
            if depth == 1 && !first_level_done {
                first_level_done = true;
                0xFF // ask to subdivide every octant of the first sub-cage we see once
            } else {
                0
            }
        });
        assert!(total_visits > 8);
    }

    #[test]
    fn orthographic_projection_has_constant_scale() {
        let projection = Projection::orthographic(2.0);
        assert!((projection.scale_at(0.0) - 2.0).abs() < 1e-6);
        assert!((projection.scale_at(100.0) - 2.0).abs() < 1e-6);
    }
}
