use glam::DVec2;
use serde::Serialize;

use crate::api::map::{MapConfig, MapRenderer};
use crate::api::types::{MapEvent, ToggleSpec};
use crate::core::scene::{MapScene, ViewTransform};
use crate::error::ViewError;
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::viewport::Viewport;

/// Toggle descriptor plus its current state, as shown by the host.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleButton {
    #[serde(flatten)]
    pub spec: ToggleSpec,
    pub on: bool,
}

/// Wraps any `MapRenderer` with viewport interaction.
///
/// Owns the input queue, the viewport and the scene. Each `tick` drains
/// input, applies batched pans once, re-renders only if the view state the
/// renderer depends on changed, and refreshes the scene transform.
pub struct MapView<R: MapRenderer> {
    renderer: R,
    viewport: Viewport,
    toggles: Vec<ToggleSpec>,
    scene: MapScene,
    input: InputQueue,
    events: Vec<MapEvent>,
    needs_render: bool,
}

impl<R: MapRenderer> MapView<R> {
    pub fn new(renderer: R, config: &MapConfig) -> Self {
        let toggles = renderer.toggles();
        let viewport = Viewport::new(config, &toggles);
        Self {
            renderer,
            viewport,
            toggles,
            scene: MapScene::new(),
            input: InputQueue::new(),
            events: Vec::new(),
            needs_render: true,
        }
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Process one frame. Returns true if the host must redraw.
    pub fn tick(&mut self) -> bool {
        for event in self.input.drain() {
            self.handle(event);
        }
        self.viewport.flush();

        if self.needs_render {
            self.renderer.render(self.viewport.state(), &mut self.scene);
            self.needs_render = false;
        }

        let transform = self.transform();
        let moved = transform != self.scene.transform;
        self.scene.set_transform(transform);
        moved || self.scene.dirty_mask() != 0
    }

    fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove { dx, dy, buttons } => {
                self.viewport.pointer_move(DVec2::new(dx, dy), buttons);
            }
            InputEvent::TouchStart { x, y } => self.viewport.touch_start(DVec2::new(x, y)),
            InputEvent::TouchMove { x, y } => self.viewport.touch_move(DVec2::new(x, y)),
            InputEvent::TouchEnd => self.viewport.touch_end(),
            InputEvent::Click { x, y } => {
                let model = self.to_model(DVec2::new(x, y));
                if let Some(event) = self.renderer.click(model, self.viewport.state()) {
                    self.events.push(event);
                }
                self.needs_render = true;
            }
            InputEvent::DoubleClick { x, y } => {
                let model = self.to_model(DVec2::new(x, y));
                if let Some(event) = self.renderer.double_click(model, self.viewport.state()) {
                    self.events.push(event);
                }
            }
            InputEvent::Zoom { direction, modifier } => {
                if self.viewport.zoom_button(direction, modifier) {
                    self.needs_render = true;
                }
            }
            InputEvent::Toggle { index } => {
                if let Err(err) = self.toggle(index) {
                    log::warn!("{err}");
                }
            }
            InputEvent::SetTime { time } => {
                if self.renderer.set_time(time) {
                    self.needs_render = true;
                }
            }
        }
    }

    /// Flip overlay `index` and schedule a re-render.
    pub fn toggle(&mut self, index: usize) -> Result<bool, ViewError> {
        let on = self.viewport.toggle(index)?;
        self.needs_render = true;
        Ok(on)
    }

    /// Current model → screen mapping.
    pub fn transform(&self) -> ViewTransform {
        ViewTransform::new(self.viewport.scale(), self.viewport.offset() - self.renderer.origin())
    }

    /// Screen point (relative to the container center) → model point.
    pub fn to_model(&self, screen: DVec2) -> DVec2 {
        self.transform().to_model(screen)
    }

    pub fn toggle_buttons(&self) -> Vec<ToggleButton> {
        self.toggles
            .iter()
            .zip(&self.viewport.state().toggles)
            .map(|(spec, &on)| ToggleButton { spec: spec.clone(), on })
            .collect()
    }

    /// Events raised since the last call.
    pub fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn scene(&self) -> &MapScene {
        &self.scene
    }

    /// The renderer's secondary scene, if it shows one.
    pub fn inset_scene(&self) -> Option<&MapScene> {
        self.renderer.inset()
    }

    pub fn scene_mut(&mut self) -> &mut MapScene {
        &mut self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable renderer access; schedules a re-render.
    pub fn renderer_mut(&mut self) -> &mut R {
        self.needs_render = true;
        &mut self.renderer
    }
}
