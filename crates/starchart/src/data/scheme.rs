//! Parsed game objects used by the maps.
//!
//! Records are parsed once, when they enter the cache, and are immutable
//! afterwards. Orbital parameters are normalised here so the solver never
//! sees a zero period.

use std::collections::BTreeMap;
use std::rc::Rc;

use glam::DVec2;
use serde_json::Value;

use crate::components::shape::Color;
use crate::data::object::ObjectData;
use crate::data::reference::ReferenceSource;
use crate::data::value::{as_array, get_float, get_int, get_point, name_of, top_level_tokens, value_at};

/// Jump range of systems that do not declare one.
pub const DEFAULT_JUMP_RANGE: f64 = 100.0;
/// Named color used by wormholes without an explicit color.
pub const DEFAULT_WORMHOLE_COLOR: &str = "map wormhole";

/// Fields shared by every game object.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObject {
    pub name: String,
    pub display_name: String,
    pub category: String,
}

impl GameObject {
    /// Read name and display name from a node; `display name` defaults to `name`.
    pub fn from_node(data: &Value, category: &str) -> Self {
        let name = name_of(data).unwrap_or_default().to_string();
        let display_name = data
            .get("display name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());
        Self {
            name,
            display_name,
            category: category.to_string(),
        }
    }

    pub fn reference(&self) -> ReferenceSource {
        ReferenceSource::new(self.category.clone(), self.name.clone())
    }
}

/// A sprite reference with its draw scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub name: String,
    pub scale: f64,
}

impl Sprite {
    fn parse(value: Option<&Value>) -> Option<Self> {
        let value = value?;
        let name = name_of(value)?.to_string();
        Some(Self {
            name,
            scale: get_float(value.get("scale"), 1.0),
        })
    }
}

/// A color written inline (`r g b [a]`) or as the name of a color object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameColor {
    pub name: Option<String>,
    pub rgba: Option<Color>,
}

impl GameColor {
    /// Parse an inline color node: `{ name: r, values: [g, b, a?] }` or a color name.
    fn parse_inline(value: Option<&Value>, default_name: Option<&str>) -> Self {
        match value {
            Some(Value::String(name)) => Self {
                name: Some(name.clone()),
                rgba: None,
            },
            Some(node) if node.is_object() => {
                let channels: Vec<f64> = std::iter::once(node.get("name"))
                    .chain(as_array(node.get("values")).into_iter().map(Some))
                    .map(|v| get_float(v, 0.0))
                    .collect();
                Self {
                    name: None,
                    rgba: Color::from_channels(&channels),
                }
            }
            _ => Self {
                name: default_name.map(str::to_string),
                rgba: None,
            },
        }
    }

    /// Parse a top-level color object, whose channels are its `values`.
    fn parse_definition(data: &Value) -> Self {
        let channels: Vec<f64> = as_array(data.get("values"))
            .into_iter()
            .map(|v| get_float(Some(v), 0.0))
            .collect();
        Self {
            name: name_of(data).map(str::to_string),
            rgba: Color::from_channels(&channels),
        }
    }

    /// Explicit color, else the named color looked up in `colors`.
    pub fn resolve(&self, colors: &CategoryTable) -> Option<Color> {
        self.rgba.or_else(|| {
            let name = self.name.as_deref()?;
            match colors.get(name)?.as_ref() {
                ParsedObject::Color { color, .. } => color.rgba,
                _ => None,
            }
        })
    }
}

/// A name with a repeat period (fleets, hazards).
#[derive(Debug, Clone, PartialEq)]
pub struct Periodic {
    pub name: String,
    pub period: i64,
}

fn periodic_list(value: Option<&Value>, period_index: usize) -> Vec<Periodic> {
    as_array(value)
        .into_iter()
        .map(|node| Periodic {
            name: name_of(node).unwrap_or_default().to_string(),
            period: get_int(value_at(node, period_index), 0),
        })
        .collect()
}

/// Orbital parameters and children of one body.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalBody {
    pub sprite: Option<Sprite>,
    /// Orbital radius around the parent, >= 0.
    pub distance: f64,
    /// Phase angle at time 0, radians.
    pub offset: f64,
    /// Orbital period, > 0.
    pub period: f64,
    pub hazards: Vec<Periodic>,
    pub objects: Vec<SystemObject>,
}

impl OrbitalBody {
    fn parse(data: &Value) -> Self {
        let mut distance = get_float(data.get("distance"), 0.0);
        if !distance.is_finite() || distance < 0.0 {
            log::warn!("orbit distance {distance} normalised to 0");
            distance = 0.0;
        }
        let mut period = get_float(data.get("period"), 1.0);
        if !period.is_finite() || period <= 0.0 {
            log::warn!("orbit period {period} normalised to 1");
            period = 1.0;
        }
        let mut offset = get_float(data.get("offset"), 0.0);
        if !offset.is_finite() {
            offset = 0.0;
        }
        Self {
            sprite: Sprite::parse(data.get("sprite")),
            distance,
            offset,
            period,
            hazards: periodic_list(data.get("hazard"), 0),
            objects: as_array(data.get("object"))
                .into_iter()
                .map(SystemObject::parse)
                .collect(),
        }
    }
}

/// One orbiting body. Named objects are planets with their own page;
/// unnamed ones are stars or decorative slots.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemObject {
    Planet { planet: GameObject, body: OrbitalBody },
    Generic(OrbitalBody),
}

impl SystemObject {
    fn parse(data: &Value) -> Self {
        let body = OrbitalBody::parse(data);
        match name_of(data) {
            Some(name) if !name.is_empty() => SystemObject::Planet {
                planet: GameObject::from_node(data, "planet"),
                body,
            },
            _ => SystemObject::Generic(body),
        }
    }

    pub fn body(&self) -> &OrbitalBody {
        match self {
            SystemObject::Planet { body, .. } => body,
            SystemObject::Generic(body) => body,
        }
    }

    pub fn planet(&self) -> Option<&GameObject> {
        match self {
            SystemObject::Planet { planet, .. } => Some(planet),
            SystemObject::Generic(_) => None,
        }
    }

    pub fn is_planet(&self) -> bool {
        matches!(self, SystemObject::Planet { .. })
    }

    pub fn children(&self) -> &[SystemObject] {
        &self.body().objects
    }

    /// Name shown for this body: the planet's display name, else its sprite.
    pub fn title(&self) -> String {
        match self {
            SystemObject::Planet { planet, .. } => planet.display_name.clone(),
            SystemObject::Generic(body) => body
                .sprite
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
        }
    }
}

/// A star system with its body forest.
#[derive(Debug, Clone, PartialEq)]
pub struct System {
    pub object: GameObject,
    pub position: DVec2,
    pub government: Option<String>,
    pub links: Vec<String>,
    pub belts: Vec<f64>,
    pub jump_range: f64,
    pub haze: Option<String>,
    pub music: Option<String>,
    pub attributes: Vec<String>,
    pub inaccessible: bool,
    pub hidden: bool,
    pub shrouded: bool,
    pub fleets: Vec<Periodic>,
    pub raid_fleets: Vec<String>,
    pub hazards: Vec<Periodic>,
    pub objects: Vec<SystemObject>,
}

impl System {
    fn parse(data: &Value) -> Self {
        Self {
            object: GameObject::from_node(data, "system"),
            position: get_point(data.get("pos")),
            government: data.get("government").and_then(name_of).map(str::to_string),
            links: as_array(data.get("link"))
                .into_iter()
                .filter_map(name_of)
                .map(str::to_string)
                .collect(),
            belts: as_array(data.get("belt"))
                .into_iter()
                .map(|belt| match belt {
                    Value::Object(map) => get_float(map.get("name"), 0.0),
                    other => get_float(Some(other), 0.0),
                })
                .collect(),
            jump_range: get_float(data.get("jump range"), DEFAULT_JUMP_RANGE),
            haze: data.get("haze").and_then(name_of).map(str::to_string),
            music: data.get("music").and_then(name_of).map(str::to_string),
            attributes: top_level_tokens(data.get("attributes")),
            inaccessible: data.get("inaccessible").is_some(),
            hidden: data.get("hidden").is_some(),
            shrouded: data.get("shrouded").is_some(),
            fleets: periodic_list(data.get("fleet"), 1),
            raid_fleets: as_array(data.get("raid"))
                .into_iter()
                .filter_map(name_of)
                .map(str::to_string)
                .collect(),
            hazards: periodic_list(data.get("hazard"), 1),
            objects: as_array(data.get("object"))
                .into_iter()
                .map(SystemObject::parse)
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn display_name(&self) -> &str {
        &self.object.display_name
    }
}

/// A directed wormhole link.
#[derive(Debug, Clone, PartialEq)]
pub struct WormholeLink {
    pub from: String,
    pub to: String,
}

/// Every parsed object kind the maps consume.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedObject {
    System(Rc<System>),
    Galaxy {
        object: GameObject,
        position: DVec2,
        sprite: Option<Sprite>,
    },
    Government {
        object: GameObject,
        color: GameColor,
    },
    Color {
        object: GameObject,
        color: GameColor,
    },
    Wormhole {
        object: GameObject,
        links: Vec<WormholeLink>,
        mappable: bool,
        color: GameColor,
    },
    Other(GameObject),
}

/// All parsed objects of one category, keyed by name.
pub type CategoryTable = BTreeMap<String, Rc<ParsedObject>>;

impl ParsedObject {
    /// Parse a raw record according to its category.
    pub fn parse(data: &ObjectData) -> Self {
        let node = data.data();
        let category = data.id.category.as_str();
        let mut object = GameObject::from_node(node, category);
        if object.name.is_empty() {
            if let Some(name) = data.id.name() {
                object.name = name.to_string();
                object.display_name = data.display_name.clone();
            }
        }
        match category {
            "system" => {
                let mut system = System::parse(node);
                system.object = object;
                ParsedObject::System(Rc::new(system))
            }
            "galaxy" => ParsedObject::Galaxy {
                object,
                position: get_point(node.get("pos")),
                sprite: Sprite::parse(node.get("sprite")),
            },
            "government" => ParsedObject::Government {
                object,
                color: GameColor::parse_inline(node.get("color"), None),
            },
            "color" => ParsedObject::Color {
                object,
                color: GameColor::parse_definition(node),
            },
            "wormhole" => ParsedObject::Wormhole {
                object,
                links: as_array(node.get("link"))
                    .into_iter()
                    .filter_map(|link| {
                        let tokens = top_level_tokens(Some(link));
                        match tokens.as_slice() {
                            [from, to, ..] => Some(WormholeLink {
                                from: from.clone(),
                                to: to.clone(),
                            }),
                            _ => None,
                        }
                    })
                    .collect(),
                mappable: node.get("mappable").is_some(),
                color: GameColor::parse_inline(node.get("color"), Some(DEFAULT_WORMHOLE_COLOR)),
            },
            _ => ParsedObject::Other(object),
        }
    }

    pub fn object(&self) -> &GameObject {
        match self {
            ParsedObject::System(system) => &system.object,
            ParsedObject::Galaxy { object, .. }
            | ParsedObject::Government { object, .. }
            | ParsedObject::Color { object, .. }
            | ParsedObject::Wormhole { object, .. }
            | ParsedObject::Other(object) => object,
        }
    }

    pub fn name(&self) -> &str {
        &self.object().name
    }

    pub fn as_system(&self) -> Option<&System> {
        match self {
            ParsedObject::System(system) => Some(system.as_ref()),
            _ => None,
        }
    }

    /// Shared handle to the system, for renderers that outlive the lookup.
    pub fn to_system(&self) -> Option<Rc<System>> {
        match self {
            ParsedObject::System(system) => Some(Rc::clone(system)),
            _ => None,
        }
    }
}
