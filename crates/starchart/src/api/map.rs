use futures::future::LocalBoxFuture;
use glam::DVec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::types::{MapEvent, ToggleSpec};
use crate::assets::files::PLACEHOLDER_IMAGE;
use crate::core::scene::MapScene;
use crate::data::cache::DataCache;
use crate::error::{DataError, ViewError};

/// Tolerance when solving for a bounding zoom step.
const STEP_EPSILON: f64 = 1e-9;

/// Configuration for a map view, provided by the host.
/// Every field has a default, so partial JSON is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Scale at zero zoom steps (default: 0.3).
    pub base_scale: f64,
    /// Scale multiplier per zoom step (default: 1.3).
    pub zoom_factor: f64,
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,
    /// Steps per zoom click while a modifier key is held (default: 5).
    pub modifier_zoom_steps: i32,
    /// Hit radius for clicks, in screen pixels (default: 12).
    pub pick_radius_px: f64,
    /// Galaxy labels are hidden below this scale (default: 0.75).
    pub label_min_scale: f64,
    pub placeholder_image: String,
    /// Simulation time used when none is given (default: 1100863).
    pub default_time: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            base_scale: 0.3,
            zoom_factor: 1.3,
            min_scale: None,
            max_scale: None,
            modifier_zoom_steps: 5,
            pick_radius_px: 12.0,
            label_min_scale: 0.75,
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
            default_time: 1_100_863.0,
        }
    }
}

impl MapConfig {
    /// Parse and validate a JSON config. An empty string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json).map_err(|e| ViewError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ViewError> {
        if !(self.base_scale > 0.0 && self.base_scale.is_finite()) {
            return Err(ViewError::Config(format!("base_scale must be positive, got {}", self.base_scale)));
        }
        if !(self.zoom_factor > 1.0 && self.zoom_factor.is_finite()) {
            return Err(ViewError::Config(format!("zoom_factor must exceed 1, got {}", self.zoom_factor)));
        }
        for bound in [self.min_scale, self.max_scale].into_iter().flatten() {
            if !(bound > 0.0 && bound.is_finite()) {
                return Err(ViewError::Config(format!("scale bounds must be positive, got {bound}")));
            }
        }
        if let (Some(min), Some(max)) = (self.min_scale, self.max_scale) {
            if min > max {
                return Err(ViewError::Config(format!("min_scale {min} exceeds max_scale {max}")));
            }
            if self.min_step(min) > self.max_step(max) {
                return Err(ViewError::Config(format!(
                    "no zoom step between min_scale {min} and max_scale {max}"
                )));
            }
        }
        if self.modifier_zoom_steps < 1 {
            return Err(ViewError::Config("modifier_zoom_steps must be at least 1".into()));
        }
        if self.pick_radius_px < 0.0 {
            return Err(ViewError::Config("pick_radius_px must not be negative".into()));
        }
        Ok(())
    }

    /// Scale after `steps` zoom increments from `base_scale`.
    pub fn scale_at(&self, steps: i32) -> f64 {
        self.base_scale * self.zoom_factor.powi(steps)
    }

    /// `steps` moved to the nearest step whose scale is within the bounds.
    pub fn clamp_steps(&self, steps: i32) -> i32 {
        let mut target = steps;
        if let Some(max) = self.max_scale {
            if self.scale_at(target) > max {
                target = self.max_step(max);
            }
        }
        if let Some(min) = self.min_scale {
            if self.scale_at(target) < min {
                target = self.min_step(min);
            }
        }
        target
    }

    /// Largest step whose scale does not exceed `max`.
    fn max_step(&self, max: f64) -> i32 {
        ((max / self.base_scale).ln() / self.zoom_factor.ln() + STEP_EPSILON).floor() as i32
    }

    /// Smallest step whose scale is at least `min`.
    fn min_step(&self, min: f64) -> i32 {
        ((min / self.base_scale).ln() / self.zoom_factor.ln() - STEP_EPSILON).ceil() as i32
    }
}

/// Interaction state handed to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub scale: f64,
    /// Pan translation in model units.
    pub offset: DVec2,
    pub toggles: Vec<bool>,
}

impl ViewState {
    /// State of toggle `index`; missing toggles read as off.
    pub fn toggle(&self, index: usize) -> bool {
        self.toggles.get(index).copied().unwrap_or(false)
    }
}

/// A map's visual content, driven by a viewport it knows nothing about.
///
/// The viewport owns scale, offset and toggles; the renderer turns a
/// `ViewState` into scene layers and answers clicks in model space.
pub trait MapRenderer {
    /// Overlay toggles, in button order.
    fn toggles(&self) -> Vec<ToggleSpec>;

    /// Model point shown at the container center when the offset is zero.
    fn origin(&self) -> DVec2 {
        DVec2::ZERO
    }

    /// Bring `scene` up to date with `view`. Implementations rebuild only
    /// the layers whose inputs changed since the previous call.
    fn render(&mut self, view: &ViewState, scene: &mut MapScene);

    fn click(&mut self, _model: DVec2, _view: &ViewState) -> Option<MapEvent> {
        None
    }

    fn double_click(&mut self, _model: DVec2, _view: &ViewState) -> Option<MapEvent> {
        None
    }

    /// Secondary scene shown next to the map, such as the selected system.
    fn inset(&self) -> Option<&MapScene> {
        None
    }

    /// Change the simulation time. Returns true when a re-render is needed.
    fn set_time(&mut self, _time: f64) -> bool {
        false
    }
}

/// A renderer that can build itself from cached data.
pub trait LoadMap: MapRenderer + Sized + 'static {
    /// Host-supplied properties, deserialized from JSON.
    type Props: DeserializeOwned;

    fn load(cache: DataCache, props: Self::Props, config: MapConfig) -> LocalBoxFuture<'static, Result<Self, DataError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MapConfig::from_json(r#"{ "max_scale": 4.0, "zoom_factor": 2.0 }"#).unwrap();
        assert_eq!(config.max_scale, Some(4.0));
        assert_eq!(config.zoom_factor, 2.0);
        assert_eq!(config.base_scale, 0.3);
        assert_eq!(config.placeholder_image, PLACEHOLDER_IMAGE);
        assert_eq!(MapConfig::from_json("").unwrap(), MapConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            MapConfig::from_json(r#"{ "zoom_factor": 1.0 }"#),
            Err(ViewError::Config(_))
        ));
        assert!(MapConfig::from_json(r#"{ "base_scale": 0 }"#).is_err());
        assert!(MapConfig::from_json(r#"{ "min_scale": 2.0, "max_scale": 1.0 }"#).is_err());
        assert!(MapConfig::from_json(r#"{ "zoom_factor": "fast" }"#).is_err());
        assert!(MapConfig::default().validate().is_ok());
    }

    #[test]
    fn bounds_must_contain_a_step() {
        let config = MapConfig {
            base_scale: 1.0,
            zoom_factor: 2.0,
            min_scale: Some(2.5),
            max_scale: Some(3.5),
            ..MapConfig::default()
        };
        assert!(matches!(config.validate(), Err(ViewError::Config(_))));

        let config = MapConfig {
            min_scale: Some(2.0),
            max_scale: Some(4.0),
            ..config
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.clamp_steps(10), 2);
        assert_eq!(config.clamp_steps(-10), 1);
        assert_eq!(config.scale_at(2), 4.0);
    }

    #[test]
    fn missing_toggle_reads_off() {
        let view = ViewState {
            scale: 1.0,
            offset: DVec2::ZERO,
            toggles: vec![true],
        };
        assert!(view.toggle(0));
        assert!(!view.toggle(3));
    }
}
