use glam::DVec2;

use crate::api::map::{MapConfig, ViewState};
use crate::api::types::ToggleSpec;
use crate::core::batch::FrameBatch;
use crate::error::ViewError;

/// DOM `buttons` bit of the primary mouse button.
const PRIMARY_BUTTON: u32 = 1;

/// Interaction state of one map: discrete zoom, pan offset, overlay toggles.
///
/// Scale is always derived from the integer step count, so stepping in and
/// back out returns to exactly the same scale.
#[derive(Debug, Clone)]
pub struct Viewport {
    config: MapConfig,
    scale_steps: i32,
    state: ViewState,
    pan: FrameBatch<DVec2>,
    /// Last absolute touch position; touch events carry no deltas.
    touch: Option<DVec2>,
}

impl Viewport {
    /// Starts at the step nearest to zero whose scale is within bounds.
    pub fn new(config: &MapConfig, toggles: &[ToggleSpec]) -> Self {
        let scale_steps = config.clamp_steps(0);
        if scale_steps != 0 {
            log::warn!("base_scale {} is out of bounds, starting at zoom step {scale_steps}", config.base_scale);
        }
        Self {
            config: config.clone(),
            scale_steps,
            state: ViewState {
                scale: config.scale_at(scale_steps),
                offset: DVec2::ZERO,
                toggles: toggles.iter().map(|t| t.initial).collect(),
            },
            pan: FrameBatch::new(),
            touch: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn scale_steps(&self) -> i32 {
        self.scale_steps
    }

    pub fn offset(&self) -> DVec2 {
        self.state.offset
    }

    pub fn set_offset(&mut self, offset: DVec2) {
        self.state.offset = offset;
    }

    /// Add `steps` zoom increments, clamping the step count to the
    /// configured scale bounds. Returns true if the scale changed.
    pub fn zoom(&mut self, steps: i32) -> bool {
        let target = self.config.clamp_steps(self.scale_steps.saturating_add(steps));
        if target == self.scale_steps {
            return false;
        }
        self.scale_steps = target;
        self.state.scale = self.config.scale_at(target);
        log::debug!("zoom to step {target} (scale {:.3})", self.state.scale);
        true
    }

    /// Zoom button press: one step, or `modifier_zoom_steps` with a modifier.
    pub fn zoom_button(&mut self, direction: i32, modifier: bool) -> bool {
        let steps = if modifier { self.config.modifier_zoom_steps } else { 1 };
        self.zoom(direction.signum() * steps)
    }

    /// Queue a pan by a screen-space delta. Applied on the next `flush`.
    /// Returns true when this push scheduled a new flush.
    pub fn pan(&mut self, screen_delta: DVec2) -> bool {
        self.pan.push(screen_delta / self.state.scale)
    }

    /// Apply all pan deltas queued since the last flush.
    /// Returns true if the offset changed.
    pub fn flush(&mut self) -> bool {
        match self.pan.flush() {
            Some(delta) if delta != DVec2::ZERO => {
                self.state.offset += delta;
                true
            }
            _ => false,
        }
    }

    pub fn has_pending_pan(&self) -> bool {
        self.pan.is_scheduled()
    }

    /// Flip toggle `index`. Returns its new state.
    pub fn toggle(&mut self, index: usize) -> Result<bool, ViewError> {
        let count = self.state.toggles.len();
        let state = self
            .state
            .toggles
            .get_mut(index)
            .ok_or(ViewError::ToggleOutOfRange { index, count })?;
        *state = !*state;
        Ok(*state)
    }

    /// Mouse movement; pans only while the primary button is held.
    pub fn pointer_move(&mut self, delta: DVec2, buttons: u32) -> bool {
        if buttons & PRIMARY_BUTTON == 0 {
            return false;
        }
        self.pan(delta);
        true
    }

    pub fn touch_start(&mut self, position: DVec2) {
        self.touch = Some(position);
    }

    /// Single-finger drag: pan by the movement since the previous touch point.
    pub fn touch_move(&mut self, position: DVec2) {
        let previous = self.touch.unwrap_or(position);
        self.touch = Some(position);
        self.pan(position - previous);
    }

    pub fn touch_end(&mut self) {
        self.touch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toggles(n: usize) -> Vec<ToggleSpec> {
        (0..n).map(|_| ToggleSpec::new("t", "on", "off")).collect()
    }

    fn viewport(config: MapConfig) -> Viewport {
        Viewport::new(&config, &toggles(3))
    }

    #[test]
    fn zoom_is_reversible() {
        let mut vp = viewport(MapConfig::default());
        let start = vp.scale();
        for _ in 0..7 {
            vp.zoom(1);
        }
        assert!((vp.scale() - 0.3 * 1.3f64.powi(7)).abs() < 1e-12);
        for _ in 0..7 {
            vp.zoom(-1);
        }
        assert_eq!(vp.scale_steps(), 0);
        assert!((vp.scale() - start).abs() < 1e-12);
    }

    #[test]
    fn zoom_clamps_step_count_at_max() {
        let mut vp = viewport(MapConfig {
            max_scale: Some(1.0),
            ..MapConfig::default()
        });
        // 0.3 * 1.3^4 = 0.857, 0.3 * 1.3^5 = 1.114
        vp.zoom(20);
        assert_eq!(vp.scale_steps(), 4);
        assert!(vp.scale() <= 1.0);
        assert!(!vp.zoom(1));
        vp.zoom(-4);
        assert_eq!(vp.scale_steps(), 0);
        assert!((vp.scale() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn zoom_clamps_step_count_at_min() {
        let mut vp = viewport(MapConfig {
            min_scale: Some(0.1),
            ..MapConfig::default()
        });
        // 0.3 / 1.3^4 = 0.105, 0.3 / 1.3^5 = 0.081
        vp.zoom(-50);
        assert_eq!(vp.scale_steps(), -4);
        assert!(vp.scale() >= 0.1);
        vp.zoom(4);
        assert_eq!(vp.scale_steps(), 0);
    }

    #[test]
    fn bound_hit_exactly_is_kept() {
        let mut vp = viewport(MapConfig {
            base_scale: 1.0,
            zoom_factor: 2.0,
            max_scale: Some(8.0),
            ..MapConfig::default()
        });
        vp.zoom(10);
        assert_eq!(vp.scale_steps(), 3);
        assert!((vp.scale() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn initial_scale_respects_bounds() {
        let vp = viewport(MapConfig {
            max_scale: Some(0.2),
            ..MapConfig::default()
        });
        // 0.3 / 1.3 = 0.231, 0.3 / 1.3^2 = 0.178
        assert_eq!(vp.scale_steps(), -2);
        assert!(vp.scale() <= 0.2);

        let mut vp = viewport(MapConfig {
            base_scale: 1.0,
            zoom_factor: 2.0,
            min_scale: Some(2.0),
            max_scale: Some(4.0),
            ..MapConfig::default()
        });
        assert_eq!(vp.scale_steps(), 1);
        assert!((vp.scale() - 2.0).abs() < 1e-12);
        vp.zoom(10);
        assert!(vp.scale() <= 4.0 + 1e-12);
        vp.zoom(-10);
        assert!(vp.scale() >= 2.0 - 1e-12);
        assert_eq!(vp.scale_steps(), 1);
    }

    #[test]
    fn modifier_zoom_uses_configured_steps() {
        let mut vp = viewport(MapConfig::default());
        vp.zoom_button(1, true);
        assert_eq!(vp.scale_steps(), 5);
        vp.zoom_button(-1, false);
        assert_eq!(vp.scale_steps(), 4);
    }

    #[test]
    fn same_frame_pans_coalesce() {
        let mut vp = viewport(MapConfig {
            base_scale: 0.5,
            ..MapConfig::default()
        });
        assert!(vp.pan(DVec2::new(10.0, 0.0)));
        assert!(!vp.pan(DVec2::new(0.0, 4.0)));
        assert!(!vp.pan(DVec2::new(2.0, 2.0)));
        assert_eq!(vp.offset(), DVec2::ZERO);
        assert!(vp.flush());
        // Screen delta (12, 6) at scale 0.5.
        assert_eq!(vp.offset(), DVec2::new(24.0, 12.0));
        assert!(!vp.flush());
        assert!(vp.pan(DVec2::new(1.0, 0.0)));
    }

    #[test]
    fn pointer_needs_primary_button() {
        let mut vp = viewport(MapConfig::default());
        assert!(!vp.pointer_move(DVec2::new(5.0, 5.0), 2));
        assert!(!vp.has_pending_pan());
        assert!(vp.pointer_move(DVec2::new(3.0, 0.0), 1 | 2));
        vp.flush();
        assert!((vp.offset().x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn touch_pans_by_difference() {
        let mut vp = viewport(MapConfig {
            base_scale: 1.0,
            ..MapConfig::default()
        });
        vp.touch_start(DVec2::new(100.0, 100.0));
        vp.touch_move(DVec2::new(110.0, 95.0));
        vp.touch_move(DVec2::new(115.0, 95.0));
        vp.flush();
        assert_eq!(vp.offset(), DVec2::new(15.0, -5.0));
        vp.touch_end();
        // A move without a start has no previous point and does not jump.
        vp.touch_move(DVec2::new(500.0, 500.0));
        vp.flush();
        assert_eq!(vp.offset(), DVec2::new(15.0, -5.0));
    }

    #[test]
    fn toggle_flips_only_one() {
        let mut vp = viewport(MapConfig::default());
        assert_eq!(vp.toggle(1), Ok(false));
        assert_eq!(vp.state().toggles, vec![true, false, true]);
        assert_eq!(vp.toggle(1), Ok(true));
        assert_eq!(
            vp.toggle(3),
            Err(ViewError::ToggleOutOfRange { index: 3, count: 3 })
        );
        assert_eq!(vp.state().toggles, vec![true, true, true]);
    }
}
