//! Scene primitives handed to the drawing layer.
//!
//! Positions and radii are in model units unless the field name ends in
//! `_px`, in which case they are screen pixels and do not scale with zoom.

use glam::Vec2;
use serde::Serialize;

use crate::data::reference::ReferenceSource;

/// RGBA color, components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Color from RGB u8 values (0-255) with full opacity.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Color from 3 or 4 channel values; fewer than 3 channels is not a color.
    pub fn from_channels(channels: &[f64]) -> Option<Self> {
        match channels {
            [r, g, b] => Some(Self::rgb(*r as f32, *g as f32, *b as f32)),
            [r, g, b, a, ..] => Some(Self::new(*r as f32, *g as f32, *b as f32, *a as f32)),
            _ => None,
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// CSS `rgba(...)` string.
    pub fn to_css(self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            (self.r * 255.0).round(),
            (self.g * 255.0).round(),
            (self.b * 255.0).round(),
            self.a
        )
    }

    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);
    /// Asteroid belt stroke (CSS saddlebrown).
    pub const SADDLE_BROWN: Self = Self::rgb(0.545, 0.271, 0.075);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One drawable element of a map layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Circle outline in model units (orbits, belts, jump radius).
    Ring {
        center: Vec2,
        radius: f32,
        stroke: Color,
        width_px: f32,
    },
    /// Circle with a fixed on-screen radius (system markers).
    Marker {
        center: Vec2,
        radius_px: f32,
        stroke: Color,
        fill: Option<Color>,
        width_px: f32,
        title: String,
        target: Option<ReferenceSource>,
    },
    /// Straight edge between two model points.
    Line {
        from: Vec2,
        to: Vec2,
        stroke: Color,
        width_px: f32,
        /// Dash length in screen pixels; solid when absent.
        dash_px: Option<f32>,
        arrow: bool,
    },
    /// Text anchored at a model point, shifted by a pixel offset.
    Text {
        pos: Vec2,
        offset_px: Vec2,
        size_px: f32,
        text: String,
    },
    /// Sprite animation centered on a model point.
    Image {
        pos: Vec2,
        rotation: f32,
        scale: f32,
        frames: Vec<String>,
        title: String,
        target: Option<ReferenceSource>,
    },
    /// Image filling the whole container, unaffected by pan and zoom.
    Backdrop { frames: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_to_color() {
        assert_eq!(Color::from_channels(&[1.0, 0.0, 0.5]), Some(Color::rgb(1.0, 0.0, 0.5)));
        assert_eq!(
            Color::from_channels(&[1.0, 1.0, 1.0, 0.25]),
            Some(Color::new(1.0, 1.0, 1.0, 0.25))
        );
        assert_eq!(Color::from_channels(&[1.0, 1.0]), None);
    }

    #[test]
    fn css_string() {
        assert_eq!(Color::rgb8(255, 0, 128).to_css(), "rgba(255, 0, 128, 1)");
    }

    #[test]
    fn shapes_serialize_with_kind_tag() {
        let shape = Shape::Ring {
            center: Vec2::ZERO,
            radius: 10.0,
            stroke: Color::GRAY,
            width_px: 2.0,
        };
        let json = serde_json::to_value(&shape).unwrap();
        assert_eq!(json["kind"], "ring");
        assert_eq!(json["radius"], 10.0);
    }
}
