//! §4.5.2: per-instance setup. Picks `maxLevel`, converts the float
//! object-to-renderbuffer matrix into the fixed-point integer form the
//! traversal walks, and precomputes everything that only depends on the
//! matrix (root extents/bounds, octant deltas, the octant map, traversal
//! order) once rather than once per node.

use super::shapes::Shape;
use super::Rect;
use crate::config::RenderConfig;
use crate::fixed::{LEVEL_LIMIT, SUBPIXEL_BITS, SUBPIXEL_SIZE};
use crate::matrix::Mat3x4;
use crate::octant_map::OctantMap;
use crate::order::{self, Order};

pub enum SetupError {
    TooBig,
    TooClose,
    Culled,
}

/// The 9 basis components of the fixed-point matrix, `[xx,xy,xz, yx,yy,yz, zx,zy,zz]`.
pub struct FixedMatrix(pub [i64; 9]);

impl FixedMatrix {
    #[inline]
    pub fn xx(&self) -> i64 {
        self.0[0]
    }
    #[inline]
    pub fn xy(&self) -> i64 {
        self.0[1]
    }
    #[inline]
    pub fn xz(&self) -> i64 {
        self.0[2]
    }
    #[inline]
    pub fn yx(&self) -> i64 {
        self.0[3]
    }
    #[inline]
    pub fn yy(&self) -> i64 {
        self.0[4]
    }
    #[inline]
    pub fn yz(&self) -> i64 {
        self.0[5]
    }
    #[inline]
    pub fn zx(&self) -> i64 {
        self.0[6]
    }
    #[inline]
    pub fn zy(&self) -> i64 {
        self.0[7]
    }
    #[inline]
    pub fn zz(&self) -> i64 {
        self.0[8]
    }
}

pub struct SetupData {
    pub matrix: FixedMatrix,
    pub tx: i64,
    pub ty: i64,
    pub tz: i64,
    pub extent_x: i64,
    pub extent_y: i64,
    pub extent_z: i64,
    pub start_z: i64,
    pub bounds: Rect,
    pub deltas: [(i64, i64, i64); 8],
    pub octant_map: OctantMap,
    pub order: Order,
    pub starting_octant: u8,
    pub max_level: i32,
    pub dilation: i64,
    pub shape: Shape,
}

impl SetupData {
    #[inline]
    pub fn forward_queue(&self, mask: u8) -> order::Queue {
        order::queue_for(self.order, self.starting_octant, mask)
    }

    /// The same octants in back-to-front order: pushing a stack in this
    /// order and popping yields the normal front-to-back sequence (§4.5.3
    /// case 5).
    #[inline]
    pub fn reverse_queue(&self, mask: u8) -> order::Queue {
        order::queue_for(self.order, 7 ^ self.starting_octant, mask)
    }
}

pub fn setup(matrix: &Mat3x4, config: &RenderConfig, viewport: Rect) -> Result<SetupData, SetupError> {
    let basis = &matrix.basis;
    let sum_x = basis.x_axis.x.abs() + basis.y_axis.x.abs() + basis.z_axis.x.abs();
    let sum_y = basis.x_axis.y.abs() + basis.y_axis.y.abs() + basis.z_axis.y.abs();
    let max_sum = sum_x.max(sum_y);

    let max_level = (0..=LEVEL_LIMIT).find(|&l| max_sum < 2f32.powi(l)).ok_or(SetupError::TooBig)?;

    let fixed = build_fixed_matrix(basis, max_level);
    let tx = round_i64(matrix.translation.x as f64 * SUBPIXEL_SIZE as f64);
    let ty = round_i64(matrix.translation.y as f64 * SUBPIXEL_SIZE as f64);
    let tz = round_i64(matrix.translation.z as f64);

    let sum_x = fixed.xx().abs() + fixed.yx().abs() + fixed.zx().abs();
    let sum_y = fixed.xy().abs() + fixed.yy().abs() + fixed.zy().abs();
    let sum_z = fixed.xz().abs() + fixed.yz().abs() + fixed.zz().abs();
    let mut extent_x = sum_x << 1;
    let mut extent_y = sum_y << 1;
    let extent_z = sum_z << 1;

    match config.shape {
        Shape::Circle => {
            let diag = ((extent_x * extent_x + extent_y * extent_y) as f64).sqrt().ceil() as i64;
            extent_x = diag;
            extent_y = diag;
        }
        Shape::Square => {
            let equalized = extent_x.max(extent_y);
            extent_x = equalized;
            extent_y = equalized;
        }
        _ => {}
    }

    let dilation = config.absolute_dilation as i64
        + ((extent_x.max(extent_y) as f64 * config.relative_dilation as f64) as i64);

    let root_rect = Rect {
        min_x: ((tx - (extent_x + dilation)) >> SUBPIXEL_BITS) as i32,
        min_y: ((ty - (extent_y + dilation)) >> SUBPIXEL_BITS) as i32,
        max_x: ((tx + (extent_x + dilation)) >> SUBPIXEL_BITS) as i32,
        max_y: ((ty + (extent_y + dilation)) >> SUBPIXEL_BITS) as i32,
    };
    let start_z = tz - extent_z;
    if start_z < 0 {
        return Err(SetupError::TooClose);
    }
    let bounds = root_rect.intersect(&viewport);
    if bounds.is_empty() {
        return Err(SetupError::Culled);
    }

    let mut deltas = [(0i64, 0i64, 0i64); 8];
    for (octant, slot) in deltas.iter_mut().enumerate() {
        let sx = if octant & 1 != 0 { 1 } else { -1 };
        let sy = if octant & 2 != 0 { 1 } else { -1 };
        let sz = if octant & 4 != 0 { 1 } else { -1 };
        let dx = fixed.xx() * sx + fixed.yx() * sy + fixed.zx() * sz;
        let dy = fixed.xy() * sx + fixed.yy() * sy + fixed.zy() * sz;
        let dz = fixed.xz() * sx + fixed.yz() * sy + fixed.zz() * sz + extent_z / 2;
        *slot = (dx, dy, dz);
    }

    let xy_deltas: [(i64, i64); 8] = std::array::from_fn(|i| (deltas[i].0, deltas[i].1));
    let octant_map = OctantMap::build(xy_deltas, extent_x, extent_y);

    let order = order::order_for(basis);
    let starting_octant = order::starting_octant_for(basis);

    Ok(SetupData {
        matrix: fixed,
        tx,
        ty,
        tz,
        extent_x,
        extent_y,
        extent_z,
        start_z,
        bounds,
        deltas,
        octant_map,
        order,
        starting_octant,
        max_level: max_level as i32,
        dilation,
        shape: config.shape,
    })
}

/// Converts the float basis into fixed point: X/Y components are scaled by
/// `2^(SubpixelBits - maxLevel)`, halved, then shifted back up by `maxLevel`
/// (a net `* 2^(SubpixelBits-1)` staged to keep the intermediate product
/// in range for any `maxLevel`); Z components go through the same staging
/// so sub-level depth deltas keep comparable precision, rather than the
/// bare halving a literal reading of "leave Z raw" would give translation.
fn build_fixed_matrix(basis: &crate::matrix::Mat3, max_level: i32) -> FixedMatrix {
    let shift1 = SUBPIXEL_BITS - max_level;
    let scale = |v: f32| -> i64 {
        let staged = round_i64(v as f64 * (1i64 << shift1) as f64);
        (staged >> 1) << max_level
    };
    FixedMatrix([
        scale(basis.x_axis.x),
        scale(basis.x_axis.y),
        scale(basis.x_axis.z),
        scale(basis.y_axis.x),
        scale(basis.y_axis.y),
        scale(basis.y_axis.z),
        scale(basis.z_axis.x),
        scale(basis.z_axis.y),
        scale(basis.z_axis.z),
    ])
}

fn round_i64(v: f64) -> i64 {
    v.round() as i64
}
