//! Window-less orbit demo: builds a small colored octree, spins a camera
//! around it for a handful of frames, and dumps each frame as a PPM file.
//! No window toolkit involved: this crate's whole contract stops at a color
//! buffer, so the demo's job is just proving that buffer looks right.

use std::f32::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};

use octosplat::{
    color::Color24, config::RenderConfig, matrix::Mat3, matrix::Mat3x4, octree::ChildLayout,
    octree::Node, octree::OctreeStore, renderbuffer::Renderbuffer, scene::Instance, scene::Scene,
    splatter::Rect, vector::V3c,
};

const WIDTH: usize = 128;
const HEIGHT: usize = 128;
const FRAMES: usize = 8;

/// A two-level octree: the root's 8 octants each hold a leaf whose color
/// encodes its own octant position, the same "color = position" pattern the
/// teacher's raytracing demo fills its tree with.
fn build_demo_octree() -> OctreeStore {
    let mut nodes = vec![Node::internal(1, 0xFF)];
    for octant in 0..8u8 {
        let r = if octant & 1 != 0 { 220 } else { 40 };
        let g = if octant & 2 != 0 { 220 } else { 40 };
        let b = if octant & 4 != 0 { 220 } else { 40 };
        nodes.push(Node::leaf(Color24::new(r, g, b)));
    }
    OctreeStore::new(nodes, ChildLayout::Sparse).expect("non-empty node list")
}

/// A camera orbiting the octree at a fixed radius/height, expressed directly
/// as the renderbuffer-space matrix the scene driver composes every
/// instance's world matrix into (no separate view/projection split: this
/// core has no 4x4 homogeneous type, see `matrix.rs`).
fn orbit_camera(angle: f32, scale: f32, depth: f32) -> Mat3x4 {
    let (sin, cos) = angle.sin_cos();
    let basis = Mat3::new(
        V3c::new(cos * scale, 0.0, sin * scale),
        V3c::new(0.0, scale, 0.0),
        V3c::new(-sin * scale, 0.0, cos * scale),
    );
    Mat3x4::new(basis, V3c::new(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0, depth))
}

fn write_ppm(path: &str, renderbuffer: &mut Renderbuffer) -> std::io::Result<()> {
    let pixels = renderbuffer.end();
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "P6\n{} {}\n255", WIDTH, HEIGHT)?;
    for pixel in pixels {
        writer.write_all(&[pixel.r, pixel.g, pixel.b])?;
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let octree = build_demo_octree();
    let viewport = Rect {
        min_x: 0,
        min_y: 0,
        max_x: WIDTH as i32 - 1,
        max_y: HEIGHT as i32 - 1,
    };
    let config = RenderConfig::default();
    let mut renderbuffer = Renderbuffer::new(WIDTH, HEIGHT);

    std::fs::create_dir_all("frames").expect("create output directory");

    for frame in 0..FRAMES {
        let angle = 2.0 * PI * frame as f32 / FRAMES as f32;
        let view_projection = orbit_camera(angle, 20.0, 80.0);
        let scene = Scene::new(view_projection, viewport, config);
        let instances = vec![Instance {
            octree: &octree,
            root_address: 0,
            world_matrix: Mat3x4::identity(),
        }];
        scene.render(&mut renderbuffer, &instances);

        let path = format!("frames/frame_{frame:03}.ppm");
        write_ppm(&path, &mut renderbuffer).expect("write frame");
        println!("wrote {path}");
    }
}
