use criterion::{criterion_group, criterion_main};

use octosplat::color::Color24;
use octosplat::config::RenderConfig;
use octosplat::matrix::{Mat3, Mat3x4};
use octosplat::octree::{ChildLayout, Node, OctreeStore};
use octosplat::renderbuffer::Renderbuffer;
use octosplat::scene::{Instance, Scene};
use octosplat::splatter::{Rect, Splatter};
use octosplat::vector::V3c;

/// A `depth`-level full octree (every node present down to `depth`), leaves
/// colored by their position in the packed array, exercising the general
/// (push-children) traversal case rather than bottoming out at a single leaf.
fn full_octree(depth: usize) -> OctreeStore {
    let mut nodes = vec![Node::internal(1, 0xFF)];
    let mut frontier = vec![0usize];
    for level in 0..depth {
        let mut next_frontier = Vec::new();
        for &parent in &frontier {
            let first_child = nodes.len() as u32;
            nodes[parent] = Node::internal(first_child, 0xFF);
            for octant in 0..8u8 {
                if level + 1 == depth {
                    let shade = (octant as u32 * 32 + level as u32 * 8) as u8;
                    nodes.push(Node::leaf(Color24::new(shade, 255 - shade, shade / 2)));
                } else {
                    nodes.push(Node::internal(0, 0)); // patched once its own children are appended
                }
            }
            for i in 0..8 {
                next_frontier.push(first_child as usize + i);
            }
        }
        frontier = next_frontier;
    }
    OctreeStore::new(nodes, ChildLayout::Sparse).unwrap()
}

fn viewport(w: i32, h: i32) -> Rect {
    Rect {
        min_x: 0,
        min_y: 0,
        max_x: w - 1,
        max_y: h - 1,
    }
}

fn criterion_benchmark(c: &mut criterion::Criterion) {
    let octree = full_octree(5);
    let config = RenderConfig::default();

    c.bench_function("splatter single instance, depth-5 octree", |b| {
        let mut rb = Renderbuffer::new(512, 512);
        let matrix = Mat3x4::new(Mat3::identity(), V3c::new(256.0, 256.0, 600.0));
        b.iter(|| {
            rb.begin(Default::default());
            let mut splatter = Splatter::begin(&mut rb, &config, viewport(512, 512));
            splatter.render(&octree, 0, &matrix);
            splatter.finish();
        });
    });

    c.bench_function("scene driver, 16 overlapping instances", |b| {
        let mut rb = Renderbuffer::new(256, 256);
        let instances: Vec<Instance> = (0..16)
            .map(|i| Instance {
                octree: &octree,
                root_address: 0,
                world_matrix: Mat3x4::new(
                    Mat3::identity(),
                    V3c::new(128.0 + i as f32, 128.0 + i as f32, 400.0 + i as f32 * 20.0),
                ),
            })
            .collect();
        let scene = Scene::new(Mat3x4::identity(), viewport(256, 256), config);
        b.iter(|| {
            scene.render(&mut rb, &instances);
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
