//! The 3x4 object-to-renderbuffer matrix (§4.5.1, §4.6.2): a rotation/scale
//! basis (`x_axis`, `y_axis`, `z_axis`: the image, under the matrix, of the
//! object's local unit axes) plus a translation. No perspective row: the
//! splatter and cage components apply the perspective divide themselves via
//! `scale = 1 / (z_intercept + z_slope * z)` (§4.5.4, §4.6.3), keeping the
//! working math in plain `V3c<f32>` rather than reaching for a 4x4
//! homogeneous type this core has no other use for.

use crate::vector::V3c;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3 {
    pub x_axis: V3c<f32>,
    pub y_axis: V3c<f32>,
    pub z_axis: V3c<f32>,
}

impl Mat3 {
    pub fn new(x_axis: V3c<f32>, y_axis: V3c<f32>, z_axis: V3c<f32>) -> Self {
        Self {
            x_axis,
            y_axis,
            z_axis,
        }
    }

    pub fn identity() -> Self {
        Self {
            x_axis: V3c::new(1.0, 0.0, 0.0),
            y_axis: V3c::new(0.0, 1.0, 0.0),
            z_axis: V3c::new(0.0, 0.0, 1.0),
        }
    }

    /// Applies the basis to a local-space vector: `x*x_axis + y*y_axis + z*z_axis`.
    pub fn apply(&self, v: V3c<f32>) -> V3c<f32> {
        self.x_axis * v.x + self.y_axis * v.y + self.z_axis * v.z
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mat3x4 {
    pub basis: Mat3,
    pub translation: V3c<f32>,
}

impl Mat3x4 {
    pub fn new(basis: Mat3, translation: V3c<f32>) -> Self {
        Self { basis, translation }
    }

    pub fn identity() -> Self {
        Self {
            basis: Mat3::identity(),
            translation: V3c::new(0.0, 0.0, 0.0),
        }
    }

    pub fn transform_point(&self, v: V3c<f32>) -> V3c<f32> {
        self.basis.apply(v) + self.translation
    }

    /// Composes `self` followed by `outer`: object space -> `self` -> `outer`.
    pub fn then(&self, outer: &Mat3x4) -> Mat3x4 {
        Mat3x4 {
            basis: Mat3::new(
                outer.basis.apply(self.basis.x_axis),
                outer.basis.apply(self.basis.y_axis),
                outer.basis.apply(self.basis.z_axis),
            ),
            translation: outer.transform_point(self.translation),
        }
    }
}
