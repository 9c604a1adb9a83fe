//! Splatter configuration surface (§6).
//!
//! A plain `Default`-able struct, (de)serializable via `serde`+`toml` behind
//! the `serialization` feature the way `hearth-engine`'s config module in
//! this pack loads its settings: a TOML file rather than a bespoke parser,
//! since the crate already carries `serde` for the octree record types.

use crate::color::Color24;
use crate::splatter::Shape;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct RenderConfig {
    /// Pixel-footprint cutoff below which a node is resolved via the 1-bit
    /// octant map instead of being subdivided further (§4.5.3 case 3).
    pub map_threshold: u32,
    /// Same, for the 64-bit refined map (§4.5.3 case 4).
    pub map_threshold8: u32,
    /// Depth cap; `-1` disables (§6).
    pub max_level: i32,
    /// Flat pixel inflation applied to every node's projected rectangle.
    pub absolute_dilation: u32,
    /// Fraction (0..1) of the root extent added as further dilation.
    pub relative_dilation: f32,
    pub shape: Shape,
    pub bounds_color: Color24,
    pub show_bounds: bool,
    /// Whether the sign-bit stencil discipline (§4.5.5) is active.
    pub stencil: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            map_threshold: 2,
            map_threshold8: 3,
            max_level: -1,
            absolute_dilation: 0,
            relative_dilation: 0.0,
            shape: Shape::default(),
            bounds_color: Color24::new(255, 255, 255),
            show_bounds: false,
            stencil: true,
        }
    }
}

#[cfg(feature = "serialization")]
impl RenderConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_conservative_map_threshold_choice() {
        let config = RenderConfig::default();
        assert_eq!(config.map_threshold, 2);
        assert_eq!(config.map_threshold8, 3);
        assert_eq!(config.max_level, -1);
        assert!(config.stencil);
    }

    #[cfg(feature = "serialization")]
    #[test]
    fn round_trips_through_toml() {
        let config = RenderConfig {
            map_threshold: 4,
            ..RenderConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        let reloaded = RenderConfig::from_toml_str(&text).unwrap();
        assert_eq!(reloaded.map_threshold, 4);
    }
}
