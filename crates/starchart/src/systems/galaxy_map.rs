use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;
use glam::DVec2;
use serde::Deserialize;

use crate::api::map::{LoadMap, MapConfig, MapRenderer, ViewState};
use crate::api::types::{MapEvent, ToggleSpec};
use crate::assets::files::GameFileList;
use crate::components::layer::MapLayer;
use crate::components::shape::{Color, Shape};
use crate::core::point::nearest_within;
use crate::core::scene::MapScene;
use crate::data::cache::DataCache;
use crate::data::reference::ReferenceSource;
use crate::data::scheme::{CategoryTable, ParsedObject, System};
use crate::error::DataError;
use crate::renderer::view::MapView;
use crate::systems::system_map::SystemMapRenderer;

pub const TOGGLE_BACKGROUND: usize = 0;
pub const TOGGLE_LINKS: usize = 1;
pub const TOGGLE_WORMHOLES: usize = 2;
pub const TOGGLE_LABELS: usize = 3;
pub const TOGGLE_JUMP_RADIUS: usize = 4;
pub const TOGGLE_MARKERS: usize = 5;

const LINE_WIDTH_PX: f32 = 1.0;
const WORMHOLE_DASH_PX: f32 = 6.0;
const MARKER_RADIUS_PX: f32 = 5.0;
const MARKER_WIDTH_PX: f32 = 2.0;
/// System label font size and offset, in model units.
const LABEL_SIZE: f64 = 12.0;
const LABEL_OFFSET: DVec2 = DVec2::new(5.0, -5.0);

/// Host properties of a galaxy map.
#[derive(Debug, Clone, Deserialize)]
pub struct GalaxyMapProps {
    /// System to center on and select.
    pub name: String,
}

/// Everything the galaxy map draws, loaded up front.
#[derive(Debug, Clone, Default)]
pub struct GalaxyData {
    pub systems: Rc<CategoryTable>,
    pub governments: Rc<CategoryTable>,
    pub colors: Rc<CategoryTable>,
    pub wormholes: Rc<CategoryTable>,
    /// Background label sprites (galaxies with a sprite).
    pub galaxies: Vec<Rc<ParsedObject>>,
    pub files: Rc<GameFileList>,
}

#[derive(Debug, Clone, PartialEq)]
struct Rendered {
    scale: f64,
    selected: Option<String>,
}

/// All systems with hyperlanes, wormholes, labels and the jump radius of
/// the selected system.
pub struct GalaxyMapRenderer {
    data: GalaxyData,
    config: MapConfig,
    /// Undirected hyperlanes as sorted name pairs, computed once.
    hyperlanes: Vec<(String, String)>,
    government_colors: BTreeMap<String, Color>,
    selected: Option<String>,
    /// System map of the selected system, shown beside the galaxy.
    inset: Option<MapView<SystemMapRenderer>>,
    origin: DVec2,
    rendered: Option<Rendered>,
}

impl GalaxyMapRenderer {
    pub fn new(data: GalaxyData, config: MapConfig, center: &str) -> Self {
        let hyperlanes = hyperlanes(&data.systems);
        let government_colors = government_colors(&data.governments, &data.colors);
        let (selected, origin) = match system(&data.systems, center) {
            Some(system) => (Some(system.name().to_string()), system.position),
            None => {
                log::warn!("system `{center}` not found, centering on the origin");
                (None, DVec2::ZERO)
            }
        };
        let mut map = Self {
            data,
            config,
            hyperlanes,
            government_colors,
            selected,
            inset: None,
            origin,
            rendered: None,
        };
        map.inset = map.selected.as_deref().and_then(|name| map.inset_for(name));
        map
    }

    /// Rendered system map of `name` at the default time.
    fn inset_for(&self, name: &str) -> Option<MapView<SystemMapRenderer>> {
        let system = self.data.systems.get(name)?.to_system()?;
        let renderer = SystemMapRenderer::new(
            system,
            Rc::clone(&self.data.files),
            self.config.clone(),
            None,
            self.config.default_time,
        );
        let mut view = MapView::new(renderer, &self.config);
        view.tick();
        Some(view)
    }

    pub fn inset_view(&self) -> Option<&MapView<SystemMapRenderer>> {
        self.inset.as_ref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn hyperlanes(&self) -> &[(String, String)] {
        &self.hyperlanes
    }

    fn systems(&self) -> impl Iterator<Item = &System> {
        self.data.systems.values().filter_map(|parsed| parsed.as_system())
    }

    fn position(&self, name: &str) -> Option<DVec2> {
        system(&self.data.systems, name).map(|s| s.position)
    }

    fn background(&self) -> Vec<Shape> {
        self.data
            .galaxies
            .iter()
            .filter_map(|galaxy| match galaxy.as_ref() {
                ParsedObject::Galaxy {
                    object,
                    position,
                    sprite: Some(sprite),
                } => Some(Shape::Image {
                    pos: position.as_vec2(),
                    rotation: 0.0,
                    scale: sprite.scale as f32,
                    frames: self.data.files.frames_or(&sprite.name, &self.config.placeholder_image),
                    title: object.display_name.clone(),
                    target: None,
                }),
                _ => None,
            })
            .collect()
    }

    fn links(&self) -> Vec<Shape> {
        self.hyperlanes
            .iter()
            .filter_map(|(a, b)| {
                Some(Shape::Line {
                    from: self.position(a)?.as_vec2(),
                    to: self.position(b)?.as_vec2(),
                    stroke: Color::GRAY,
                    width_px: LINE_WIDTH_PX,
                    dash_px: None,
                    arrow: false,
                })
            })
            .collect()
    }

    fn wormholes(&self) -> Vec<Shape> {
        let mut shapes = Vec::new();
        for parsed in self.data.wormholes.values() {
            let ParsedObject::Wormhole { links, color, .. } = parsed.as_ref() else {
                continue;
            };
            let stroke = color.resolve(&self.data.colors).unwrap_or(Color::GRAY);
            for link in links {
                if let (Some(from), Some(to)) = (self.position(&link.from), self.position(&link.to)) {
                    shapes.push(Shape::Line {
                        from: from.as_vec2(),
                        to: to.as_vec2(),
                        stroke,
                        width_px: LINE_WIDTH_PX,
                        dash_px: Some(WORMHOLE_DASH_PX),
                        arrow: true,
                    });
                }
            }
        }
        shapes
    }

    fn labels(&self, scale: f64) -> Vec<Shape> {
        let size_px = (LABEL_SIZE * scale) as f32;
        let offset_px = (LABEL_OFFSET * scale).as_vec2();
        self.systems()
            .map(|system| Shape::Text {
                pos: system.position.as_vec2(),
                offset_px,
                size_px,
                text: system.display_name().to_string(),
            })
            .collect()
    }

    fn jump_radius(&self) -> Vec<Shape> {
        self.selected_system()
            .map(|system| Shape::Ring {
                center: system.position.as_vec2(),
                radius: system.jump_range as f32,
                stroke: Color::GRAY,
                width_px: LINE_WIDTH_PX,
            })
            .into_iter()
            .collect()
    }

    fn markers(&self) -> Vec<Shape> {
        self.systems()
            .map(|system| {
                let stroke = system
                    .government
                    .as_ref()
                    .and_then(|gov| self.government_colors.get(gov))
                    .copied()
                    .unwrap_or(Color::GRAY);
                let selected = self.selected.as_deref() == Some(system.name());
                Shape::Marker {
                    center: system.position.as_vec2(),
                    radius_px: MARKER_RADIUS_PX,
                    stroke,
                    fill: selected.then_some(Color::WHITE),
                    width_px: MARKER_WIDTH_PX,
                    title: system.display_name().to_string(),
                    target: Some(system.object.reference()),
                }
            })
            .collect()
    }

    fn selected_system(&self) -> Option<&System> {
        system(&self.data.systems, self.selected.as_deref()?)
    }

    fn pick(&self, model: DVec2, view: &ViewState) -> Option<&System> {
        let radius = self.config.pick_radius_px / view.scale;
        nearest_within(self.systems().map(|s| (s.position, s)), model, radius)
    }
}

fn system<'a>(systems: &'a CategoryTable, name: &str) -> Option<&'a System> {
    systems.get(name).and_then(|parsed| parsed.as_system())
}

/// One edge per unordered pair of linked systems that both exist.
fn hyperlanes(systems: &CategoryTable) -> Vec<(String, String)> {
    let mut pairs = BTreeSet::new();
    for system in systems.values().filter_map(|parsed| parsed.as_system()) {
        for link in &system.links {
            let name = system.name();
            if link == name || !systems.contains_key(link) {
                continue;
            }
            let pair = if name < link.as_str() {
                (name.to_string(), link.clone())
            } else {
                (link.clone(), name.to_string())
            };
            pairs.insert(pair);
        }
    }
    pairs.into_iter().collect()
}

/// Resolved stroke color per government name.
fn government_colors(governments: &CategoryTable, colors: &CategoryTable) -> BTreeMap<String, Color> {
    governments
        .values()
        .filter_map(|parsed| match parsed.as_ref() {
            ParsedObject::Government { object, color } => {
                Some((object.name.clone(), color.resolve(colors)?))
            }
            _ => None,
        })
        .collect()
}

impl MapRenderer for GalaxyMapRenderer {
    fn toggles(&self) -> Vec<ToggleSpec> {
        vec![
            ToggleSpec::new("Toggle background", "image-fill", "image"),
            ToggleSpec::new("Toggle hyperlinks", "caret-right-square-fill", "caret-right-square"),
            ToggleSpec::new("Toggle wormholes", "arrow-right-square-fill", "arrow-right-square"),
            ToggleSpec::new("Toggle system labels", "chat-left-fill", "chat-left"),
            ToggleSpec::new("Toggle jump radius", "circle-fill", "circle"),
            ToggleSpec::new("Toggle system markers", "crosshair2", "crosshair"),
        ]
    }

    fn origin(&self) -> DVec2 {
        self.origin
    }

    fn render(&mut self, view: &ViewState, scene: &mut MapScene) {
        let current = Rendered {
            scale: view.scale,
            selected: self.selected.clone(),
        };
        let previous = self.rendered.take();

        if previous.is_none() {
            scene.rebuild(MapLayer::Background, self.background());
            scene.rebuild(MapLayer::Links, self.links());
            scene.rebuild(MapLayer::Wormholes, self.wormholes());
        }
        if previous.as_ref().map_or(true, |p| p.scale != current.scale) {
            scene.rebuild(MapLayer::Labels, self.labels(view.scale));
        }
        if previous.as_ref().map_or(true, |p| p.selected != current.selected) {
            scene.rebuild(MapLayer::JumpRadius, self.jump_radius());
            scene.rebuild(MapLayer::Markers, self.markers());
        }

        scene.set_visible(MapLayer::Background, view.toggle(TOGGLE_BACKGROUND));
        scene.set_visible(MapLayer::Links, view.toggle(TOGGLE_LINKS));
        scene.set_visible(MapLayer::Wormholes, view.toggle(TOGGLE_WORMHOLES));
        scene.set_visible(
            MapLayer::Labels,
            view.toggle(TOGGLE_LABELS) && view.scale >= self.config.label_min_scale,
        );
        scene.set_visible(MapLayer::JumpRadius, view.toggle(TOGGLE_JUMP_RADIUS));
        scene.set_visible(MapLayer::Markers, view.toggle(TOGGLE_MARKERS));
        self.rendered = Some(current);
    }

    /// Select the system under the cursor.
    fn click(&mut self, model: DVec2, view: &ViewState) -> Option<MapEvent> {
        let name = self.pick(model, view)?.name().to_string();
        if self.selected.as_deref() != Some(name.as_str()) {
            self.inset = self.inset_for(&name);
            self.selected = Some(name.clone());
        }
        Some(MapEvent::Selected(name))
    }

    fn double_click(&mut self, model: DVec2, view: &ViewState) -> Option<MapEvent> {
        let system = self.pick(model, view)?;
        Some(MapEvent::Navigate(system.object.reference()))
    }

    fn inset(&self) -> Option<&MapScene> {
        self.inset.as_ref().map(|view| view.scene())
    }
}

impl LoadMap for GalaxyMapRenderer {
    type Props = GalaxyMapProps;

    fn load(cache: DataCache, props: GalaxyMapProps, config: MapConfig) -> LocalBoxFuture<'static, Result<Self, DataError>> {
        async move {
            let systems = cache.all("system").await?;
            let (governments, colors, wormholes, galaxies, files) = futures::join!(
                optional(cache.all("government"), "governments"),
                optional(cache.all("color"), "colors"),
                optional(cache.all("wormhole"), "wormholes"),
                galaxy_labels(&cache),
                cache.file_list(),
            );
            let files = files.unwrap_or_else(|err| {
                log::warn!("no file list, using placeholders: {err}");
                Rc::new(GameFileList::default())
            });
            log::info!("galaxy map with {} systems", systems.len());
            let data = GalaxyData {
                systems,
                governments,
                colors,
                wormholes,
                galaxies,
                files,
            };
            Ok(Self::new(data, config, &props.name))
        }
        .boxed_local()
    }
}

/// A category the map can draw without; failures degrade to an empty table.
async fn optional<F>(table: F, what: &str) -> Rc<CategoryTable>
where
    F: std::future::Future<Output = Result<Rc<CategoryTable>, DataError>>,
{
    table.await.unwrap_or_else(|err| {
        log::warn!("galaxy map drawn without {what}: {err}");
        Rc::default()
    })
}

/// Galaxies that carry a label sprite, resolved one by one from the index.
async fn galaxy_labels(cache: &DataCache) -> Vec<Rc<ParsedObject>> {
    let index = match cache.index("galaxy").await {
        Ok(index) => index,
        Err(err) => {
            log::warn!("no galaxy index: {err}");
            return Vec::new();
        }
    };
    let lookups = index
        .keys()
        .map(|name| cache.parsed(&ReferenceSource::new("galaxy", name)));
    join_all(lookups)
        .await
        .into_iter()
        .filter_map(Result::ok)
        .filter(|parsed| matches!(parsed.as_ref(), ParsedObject::Galaxy { sprite: Some(_), .. }))
        .collect()
}
