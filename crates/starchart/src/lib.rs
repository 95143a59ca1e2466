pub mod api;
pub mod core;
pub mod components;
pub mod data;
pub mod assets;
pub mod input;
pub mod renderer;
pub mod systems;
pub mod error;

// Re-export key types at crate root for convenience
pub use api::map::{LoadMap, MapConfig, MapRenderer, ViewState};
pub use api::types::{MapEvent, ToggleSpec};
pub use assets::files::{GameFileList, PLACEHOLDER_IMAGE};
pub use components::layer::MapLayer;
pub use components::shape::{Color, Shape};
pub use core::batch::FrameBatch;
pub use core::orbit::{objects_and_positions, ObjectsAndPositions, PlacedObject};
pub use core::point::{Bounds, Point, PointExt};
pub use core::scene::{BakeState, MapScene, ViewTransform};
pub use data::cache::{DataCache, EntityCache, EntitySource, Pending};
pub use data::object::{ChangeData, CommitData, ObjectData, RecordData};
pub use data::reference::{find_source, ReferenceIndex, ReferenceSource};
pub use data::scheme::{CategoryTable, GameObject, ParsedObject, System, SystemObject};
pub use error::{DataError, ViewError};
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::{MapView, ToggleButton, Viewport};
pub use systems::galaxy_map::{GalaxyMapProps, GalaxyMapRenderer};
pub use systems::system_map::{SystemMapProps, SystemMapRenderer};
