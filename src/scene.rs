//! C7: the scene driver (§4.7), per-frame setup over a list of instances.
//! Clears the renderbuffer, orders instances coarsely front-to-back, and
//! dispatches each either straight to the splatter or, when the splatter
//! reports `TooBig`/`TooClose`, to the cage subdivider.

use crate::cage::{self, Cage, Projection};
use crate::color::Color32;
use crate::config::RenderConfig;
use crate::matrix::Mat3x4;
use crate::octree::OctreeStore;
use crate::renderbuffer::Renderbuffer;
use crate::splatter::{Rect, RenderOutcome, Splatter};
use crate::vector::V3c;

/// One instance of an octree placed in the scene, as named in §4.7.
pub struct Instance<'a> {
    pub octree: &'a OctreeStore,
    pub root_address: u32,
    pub world_matrix: Mat3x4,
}

/// Per-frame driver state: the renderbuffer-space view/projection matrix
/// applied uniformly to every instance's `world_matrix` before splatting.
pub struct Scene {
    pub view_projection: Mat3x4,
    pub viewport: Rect,
    pub config: RenderConfig,
    pub background: Color32,
}

impl Scene {
    pub fn new(view_projection: Mat3x4, viewport: Rect, config: RenderConfig) -> Self {
        Self {
            view_projection,
            viewport,
            config,
            background: Color32::default(),
        }
    }

    /// Renders one frame's worth of instances into `renderbuffer`.
    ///
    /// 1. clears depth/color (§4.2),
    /// 2. coarse front-to-back sorts instances by the depth of their
    ///    composite matrix's translation,
    /// 3. for each, composes `world_matrix -> view_projection` and calls the
    ///    splatter; on `TooBig`/`TooClose` falls back to the cage subdivider.
    pub fn render(&self, renderbuffer: &mut Renderbuffer, instances: &[Instance]) {
        renderbuffer.begin(self.background);

        let mut order: Vec<usize> = (0..instances.len()).collect();
        let composed: Vec<Mat3x4> = instances
            .iter()
            .map(|inst| inst.world_matrix.then(&self.view_projection))
            .collect();
        order.sort_by(|&a, &b| {
            composed[a]
                .translation
                .z
                .partial_cmp(&composed[b].translation.z)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut splatter = Splatter::begin(renderbuffer, &self.config, self.viewport);
        for &i in &order {
            let instance = &instances[i];
            let matrix = composed[i];
            let outcome = splatter.render(instance.octree, instance.root_address, &matrix);
            splatter.finish();
            if matches!(outcome, RenderOutcome::TooBig | RenderOutcome::TooClose) {
                self.render_via_cage(&mut splatter, instance, &matrix);
            }
        }
    }

    /// Falls back to the cage subdivider for an instance the splatter
    /// couldn't project directly: recursively halves the instance's bounding
    /// cage until each sub-cage's composite matrix is small/far enough for
    /// the splatter to accept (§4.7 step 3).
    fn render_via_cage(&self, splatter: &mut Splatter, instance: &Instance, matrix: &Mat3x4) {
        let cage = unit_cage(matrix);
        let projection = Projection::orthographic(1.0);
        let root_mask = self.octree_root_mask(instance);

        cage::subdivide(cage, None, |sub_cage, _depth| {
            let sub_matrix = cage_to_matrix(sub_cage, &projection);
            let Some(child_address) = self.pick_child(instance, root_mask, sub_cage) else {
                return 0;
            };
            match splatter.render(instance.octree, child_address, &sub_matrix) {
                RenderOutcome::TooBig | RenderOutcome::TooClose => 0xFF,
                _ => {
                    splatter.finish();
                    0
                }
            }
        });
    }

    fn octree_root_mask(&self, instance: &Instance) -> u8 {
        instance.octree.mask(instance.root_address)
    }

    /// Picks the child address a sub-cage corresponds to: the octant nearest
    /// the sub-cage's centroid in the root's local (unit-cube) space.
    fn pick_child(&self, instance: &Instance, root_mask: u8, sub_cage: &Cage) -> Option<u32> {
        if root_mask == 0 {
            return Some(instance.root_address);
        }
        let centroid = sub_cage.iter().fold(V3c::new(0.0, 0.0, 0.0), |a, &b| a + b) / 8.0;
        let octant = (if centroid.x >= 0.0 { 1 } else { 0 })
            | (if centroid.y >= 0.0 { 2 } else { 0 })
            | (if centroid.z >= 0.0 { 4 } else { 0 });
        instance.octree.child_address(instance.root_address, octant)
    }

    /// Tests whether `region` at depth `z` is already fully occluded in the
    /// current renderbuffer state, without writing anything: the `IsOccluded`
    /// query §4.7/§6 names as a driver-level convenience over C2's depth
    /// test. Scans `region` row by row, returning early as soon as a pixel
    /// still passes the depth test at `z`; the bool is true only if every
    /// scanned pixel rejected `z`, and the second element is the last row
    /// actually scanned (the row the early exit happened on, or `region`'s
    /// last row if the whole region turned out occluded).
    pub fn is_occluded(&self, renderbuffer: &Renderbuffer, region: Rect, z: i64) -> (bool, i32) {
        if region.is_empty() {
            return (true, region.min_y);
        }
        let mut last_y = region.min_y;
        for y in region.min_y..=region.max_y {
            last_y = y;
            for x in region.min_x..=region.max_x {
                let index = renderbuffer.pixel_index(x as usize, y as usize);
                if renderbuffer.test(index, z) {
                    return (false, last_y);
                }
            }
        }
        (true, last_y)
    }
}

/// The instance's local unit cube `[-1,1]^3`, transformed by its composite
/// matrix, as the cage handed to the subdivider.
fn unit_cage(matrix: &Mat3x4) -> Cage {
    let mut cage = [V3c::new(0.0, 0.0, 0.0); 8];
    for (octant, slot) in cage.iter_mut().enumerate() {
        let sx = if octant & 1 != 0 { 1.0 } else { -1.0 };
        let sy = if octant & 2 != 0 { 1.0 } else { -1.0 };
        let sz = if octant & 4 != 0 { 1.0 } else { -1.0 };
        *slot = matrix.transform_point(V3c::new(sx, sy, sz));
    }
    cage
}

/// Builds a composite matrix for a sub-cage: translation is its centroid,
/// basis is half the vector from its near-corner to its far-corner along
/// each local axis (the same linear approximation §4.6.3 describes for a
/// cage's interior: exact for a parallelepiped sub-cage, approximate once
/// perspective has skewed it).
fn cage_to_matrix(sub_cage: &Cage, _projection: &Projection) -> Mat3x4 {
    let centroid = sub_cage.iter().fold(V3c::new(0.0, 0.0, 0.0), |a, &b| a + b) / 8.0;
    let x_axis = (sub_cage[1] - sub_cage[0]) / 2.0;
    let y_axis = (sub_cage[2] - sub_cage[0]) / 2.0;
    let z_axis = (sub_cage[4] - sub_cage[0]) / 2.0;
    Mat3x4::new(crate::matrix::Mat3::new(x_axis, y_axis, z_axis), centroid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color24;
    use crate::matrix::Mat3;
    use crate::octree::{ChildLayout, Node};

    fn single_voxel(color: Color24) -> OctreeStore {
        OctreeStore::new(vec![Node::leaf(color)], ChildLayout::Sparse).unwrap()
    }

    fn viewport(w: i32, h: i32) -> Rect {
        Rect {
            min_x: 0,
            min_y: 0,
            max_x: w - 1,
            max_y: h - 1,
        }
    }

    fn translated(x: f32, y: f32, z: f32) -> Mat3x4 {
        Mat3x4::new(Mat3::identity(), V3c::new(x, y, z))
    }

    #[test]
    fn nearer_instance_occludes_farther_one_regardless_of_render_order() {
        let near = single_voxel(Color24::new(255, 0, 0));
        let far = single_voxel(Color24::new(0, 255, 0));
        let instances = vec![
            Instance {
                octree: &far,
                root_address: 0,
                world_matrix: translated(8.0, 8.0, 200.0),
            },
            Instance {
                octree: &near,
                root_address: 0,
                world_matrix: translated(8.0, 8.0, 100.0),
            },
        ];
        let scene = Scene::new(Mat3x4::identity(), viewport(16, 16), RenderConfig::default());
        let mut rb = Renderbuffer::new(16, 16);
        scene.render(&mut rb, &instances);
        let painted = rb.color_at(rb.pixel_index(8, 8));
        assert_eq!(painted, Color32::new(255, 0, 0, 255));
    }

    #[test]
    fn empty_scene_leaves_the_buffer_at_background() {
        let scene = Scene::new(Mat3x4::identity(), viewport(4, 4), RenderConfig::default());
        let mut rb = Renderbuffer::new(4, 4);
        scene.render(&mut rb, &[]);
        assert_eq!(rb.color_at(rb.pixel_index(0, 0)), Color32::default());
    }

    #[test]
    fn is_occluded_reflects_a_prior_write() {
        let voxel = single_voxel(Color24::new(1, 2, 3));
        let instances = vec![Instance {
            octree: &voxel,
            root_address: 0,
            world_matrix: translated(8.0, 8.0, 100.0),
        }];
        let scene = Scene::new(Mat3x4::identity(), viewport(16, 16), RenderConfig::default());
        let mut rb = Renderbuffer::new(16, 16);
        scene.render(&mut rb, &instances);
        let pixel = Rect {
            min_x: 8,
            min_y: 8,
            max_x: 8,
            max_y: 8,
        };
        let (occluded, last_y) = scene.is_occluded(&rb, pixel, 1000);
        assert!(occluded);
        assert_eq!(last_y, 8);
        let (occluded, _) = scene.is_occluded(&rb, pixel, 1);
        assert!(!occluded);
    }

    #[test]
    fn is_occluded_stops_scanning_at_the_first_visible_row() {
        let voxel = single_voxel(Color24::new(1, 2, 3));
        let instances = vec![Instance {
            octree: &voxel,
            root_address: 0,
            world_matrix: translated(8.0, 8.0, 100.0),
        }];
        let scene = Scene::new(Mat3x4::identity(), viewport(16, 16), RenderConfig::default());
        let mut rb = Renderbuffer::new(16, 16);
        scene.render(&mut rb, &instances);
        // a region spanning rows 0..=8: row 8 is where the voxel landed, so
        // a near-enough z should pass the depth test there and short-circuit.
        let region = Rect {
            min_x: 8,
            min_y: 0,
            max_x: 8,
            max_y: 8,
        };
        let (occluded, last_y) = scene.is_occluded(&rb, region, 1);
        assert!(!occluded);
        assert_eq!(last_y, 8);
    }
}
