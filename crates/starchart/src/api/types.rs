use serde::Serialize;

use crate::data::reference::ReferenceSource;

/// Event raised by a map for the host page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MapEvent {
    /// Open the page of an entity. URL construction is the host's job.
    Navigate(ReferenceSource),
    /// A system was selected on the galaxy map.
    Selected(String),
}

/// One overlay toggle button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleSpec {
    pub title: &'static str,
    /// Icon shown while the overlay is on.
    pub icon_on: &'static str,
    pub icon_off: &'static str,
    pub initial: bool,
}

impl ToggleSpec {
    pub const fn new(title: &'static str, icon_on: &'static str, icon_off: &'static str) -> Self {
        Self {
            title,
            icon_on,
            icon_off,
            initial: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_adjacently_tagged() {
        let nav = serde_json::to_value(MapEvent::Navigate(ReferenceSource::new("planet", "Earth"))).unwrap();
        assert_eq!(nav["kind"], "navigate");
        assert_eq!(nav["value"]["type"], "planet");
        let sel = serde_json::to_value(MapEvent::Selected("Sol".into())).unwrap();
        assert_eq!(sel["value"], "Sol");
    }
}
