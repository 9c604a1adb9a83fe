//! Pixel color types.
//!
//! `Color24` is the opaque leaf payload stored in the octree (and the on-disk
//! record format, §6). `Color32` is the renderbuffer pixel; an RGB-only write
//! aliases onto its low three bytes so it never disturbs the alpha channel,
//! the same byte-packed-`u32` convention an albedo accessor on a voxel
//! payload type would use.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Color24 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color24 {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_color32(self, a: u8) -> Color32 {
        Color32::new(self.r, self.g, self.b, a)
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct Color32 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color32 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Packed little-endian RGBA32, matching the tightly packed output format in §6.
    pub fn to_bits(self) -> u32 {
        (self.r as u32) | ((self.g as u32) << 8) | ((self.b as u32) << 16) | ((self.a as u32) << 24)
    }

    /// Overwrites R,G,B in place while leaving A untouched: the pixel-aliasing
    /// behavior §3 requires of a leaf write.
    pub fn write_rgb(&mut self, rgb: Color24) {
        self.r = rgb.r;
        self.g = rgb.g;
        self.b = rgb.b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_write_preserves_alpha() {
        let mut px = Color32::new(0, 0, 0, 200);
        px.write_rgb(Color24::new(10, 20, 30));
        assert_eq!(px, Color32::new(10, 20, 30, 200));
    }
}
