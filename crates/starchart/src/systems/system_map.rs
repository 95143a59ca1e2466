use std::f64::consts::FRAC_PI_2;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use glam::{DVec2, Vec2};
use serde::Deserialize;

use crate::api::map::{LoadMap, MapConfig, MapRenderer, ViewState};
use crate::api::types::{MapEvent, ToggleSpec};
use crate::assets::files::GameFileList;
use crate::components::layer::MapLayer;
use crate::components::shape::{Color, Shape};
use crate::core::orbit::ObjectsAndPositions;
use crate::core::point::nearest_within;
use crate::core::scene::MapScene;
use crate::data::cache::DataCache;
use crate::data::scheme::System;
use crate::error::DataError;

pub const TOGGLE_ORBITS: usize = 0;
pub const TOGGLE_BELTS: usize = 1;
pub const TOGGLE_LABELS: usize = 2;

const ORBIT_WIDTH_PX: f32 = 2.0;
const BELT_WIDTH_PX: f32 = 10.0;
const LABEL_OFFSET_PX: Vec2 = Vec2::new(5.0, -5.0);
const LABEL_MAX_PX: f64 = 40.0;
/// Label size in model units, before the screen cap.
const LABEL_MODEL_SIZE: f64 = 200.0;

/// Host properties of a system map.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemMapProps {
    /// System to show.
    pub name: String,
    /// Planet to keep at the center of the view.
    #[serde(default)]
    pub center: Option<String>,
    #[serde(default)]
    pub time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rendered {
    time: f64,
    scale: f64,
}

/// Orbits, belts, bodies and planet labels of one star system at one time.
pub struct SystemMapRenderer {
    system: Rc<System>,
    files: Rc<GameFileList>,
    config: MapConfig,
    center: Option<String>,
    time: f64,
    origin: DVec2,
    rendered: Option<Rendered>,
}

impl SystemMapRenderer {
    pub fn new(
        system: Rc<System>,
        files: Rc<GameFileList>,
        config: MapConfig,
        center: Option<String>,
        time: f64,
    ) -> Self {
        let mut map = Self {
            system,
            files,
            config,
            center,
            time,
            origin: DVec2::ZERO,
            rendered: None,
        };
        map.origin = map.center_position();
        map
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Position of the center planet, or the barycenter.
    fn center_position(&self) -> DVec2 {
        self.center
            .as_deref()
            .and_then(|name| self.system.planet_position(name, self.time))
            .unwrap_or(DVec2::ZERO)
    }

    fn background(&self) -> Vec<Shape> {
        match &self.system.haze {
            Some(haze) => vec![Shape::Backdrop {
                frames: self.files.frames_or(haze, &self.config.placeholder_image),
            }],
            None => Vec::new(),
        }
    }

    fn belts(&self) -> Vec<Shape> {
        self.system
            .belts
            .iter()
            .map(|&radius| Shape::Ring {
                center: Vec2::ZERO,
                radius: radius as f32,
                stroke: Color::SADDLE_BROWN,
                width_px: BELT_WIDTH_PX,
            })
            .collect()
    }

    fn orbits(placed: &ObjectsAndPositions<'_>) -> Vec<Shape> {
        placed
            .objects
            .iter()
            .filter(|p| p.orbital_radius > 0.0)
            .map(|p| Shape::Ring {
                center: p.orbital_center.as_vec2(),
                radius: p.orbital_radius as f32,
                stroke: Color::GRAY,
                width_px: ORBIT_WIDTH_PX,
            })
            .collect()
    }

    fn bodies(&self, placed: &ObjectsAndPositions<'_>) -> Vec<Shape> {
        placed
            .objects
            .iter()
            .map(|p| {
                let body = p.object.body();
                let frames = match &body.sprite {
                    Some(sprite) => self.files.frames_or(&sprite.name, &self.config.placeholder_image),
                    None => vec![self.config.placeholder_image.clone()],
                };
                Shape::Image {
                    pos: p.position.as_vec2(),
                    // Face outward along the radius.
                    rotation: (p.position.y.atan2(p.position.x) + FRAC_PI_2) as f32,
                    scale: body.sprite.as_ref().map_or(1.0, |s| s.scale) as f32,
                    frames,
                    title: p.object.title(),
                    target: p.object.planet().map(|planet| planet.reference()),
                }
            })
            .collect()
    }

    fn labels(placed: &ObjectsAndPositions<'_>, scale: f64) -> Vec<Shape> {
        let size_px = (LABEL_MODEL_SIZE * scale).min(LABEL_MAX_PX) as f32;
        placed
            .objects
            .iter()
            .filter_map(|p| {
                let planet = p.object.planet()?;
                Some(Shape::Text {
                    pos: p.position.as_vec2(),
                    offset_px: LABEL_OFFSET_PX,
                    size_px,
                    text: planet.display_name.clone(),
                })
            })
            .collect()
    }
}

impl MapRenderer for SystemMapRenderer {
    fn toggles(&self) -> Vec<ToggleSpec> {
        vec![
            ToggleSpec::new("Toggle orbits", "crosshair2", "crosshair"),
            ToggleSpec::new("Toggle asteroid belts", "circle-fill", "circle"),
            ToggleSpec::new("Toggle planet labels", "chat-left-fill", "chat-left"),
        ]
    }

    fn origin(&self) -> DVec2 {
        self.origin
    }

    fn render(&mut self, view: &ViewState, scene: &mut MapScene) {
        let previous = self.rendered;
        let current = Rendered {
            time: self.time,
            scale: view.scale,
        };

        if previous.is_none() {
            scene.rebuild(MapLayer::Background, self.background());
            scene.rebuild(MapLayer::Belts, self.belts());
        }
        let time_changed = previous.map_or(true, |p| p.time != current.time);
        let scale_changed = previous.map_or(true, |p| p.scale != current.scale);
        if time_changed || scale_changed {
            let placed = self.system.objects_and_positions(self.time);
            if time_changed {
                scene.rebuild(MapLayer::Orbits, Self::orbits(&placed));
                scene.rebuild(MapLayer::Bodies, self.bodies(&placed));
            }
            scene.rebuild(MapLayer::Labels, Self::labels(&placed, view.scale));
        }

        scene.set_visible(MapLayer::Orbits, view.toggle(TOGGLE_ORBITS));
        scene.set_visible(MapLayer::Belts, view.toggle(TOGGLE_BELTS));
        scene.set_visible(MapLayer::Labels, view.toggle(TOGGLE_LABELS));
        self.rendered = Some(current);
    }

    /// Double-clicking a planet opens its page; anything else is ignored.
    fn double_click(&mut self, model: DVec2, view: &ViewState) -> Option<MapEvent> {
        let placed = self.system.objects_and_positions(self.time);
        let radius = self.config.pick_radius_px / view.scale;
        let planets = placed
            .objects
            .iter()
            .filter_map(|p| Some((p.position, p.object.planet()?)));
        let planet = nearest_within(planets, model, radius)?;
        Some(MapEvent::Navigate(planet.reference()))
    }

    fn set_time(&mut self, time: f64) -> bool {
        if time == self.time {
            return false;
        }
        self.time = time;
        self.origin = self.center_position();
        true
    }
}

impl LoadMap for SystemMapRenderer {
    type Props = SystemMapProps;

    fn load(cache: DataCache, props: SystemMapProps, config: MapConfig) -> LocalBoxFuture<'static, Result<Self, DataError>> {
        async move {
            let (system, files) = futures::join!(cache.system(&props.name), cache.file_list());
            let system = system?;
            let files = files.unwrap_or_else(|err| {
                log::warn!("no file list, using placeholders: {err}");
                Rc::new(GameFileList::default())
            });
            let time = props.time.unwrap_or(config.default_time);
            log::info!("system map `{}` at time {time}", system.name());
            Ok(Self::new(system, files, config, props.center, time))
        }
        .boxed_local()
    }
}
