use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural key addressing a game entity.
///
/// Two keys with the same category and name are the same entity. A `None`
/// name addresses the category itself (e.g. the planet category page);
/// `None` and `Some("")` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReferenceSource {
    #[serde(rename = "type")]
    pub category: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl ReferenceSource {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: Some(name.into()),
        }
    }

    /// Key for the category-level pseudo-entity.
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Relative data path segments: `category/name`, or just `category`.
    pub fn path(&self) -> String {
        match &self.name {
            Some(name) => format!("{}/{}", self.category, name),
            None => self.category.clone(),
        }
    }
}

impl fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} `{}`", self.category, name),
            None => write!(f, "{} (category)", self.category),
        }
    }
}

/// Linear scan for the first element structurally equal to `key`.
pub fn find_source<'a, I>(key: &ReferenceSource, collection: I) -> Option<&'a ReferenceSource>
where
    I: IntoIterator<Item = &'a ReferenceSource>,
{
    collection.into_iter().find(|candidate| *candidate == key)
}

/// Ordered multimap from a display name to the entities that carry it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceIndex {
    entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    pub value: Vec<ReferenceSource>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the wire form `{ "<name>": [<source>, ...], ... }`.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, Vec<ReferenceSource>> = serde_json::from_str(text)?;
        let mut index = Self::new();
        for (name, sources) in raw {
            for source in sources {
                index.add_entry(&name, source);
            }
        }
        Ok(index)
    }

    /// Every key, in index order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Add `source` under `name`, ignoring structural duplicates.
    pub fn add_entry(&mut self, name: &str, source: ReferenceSource) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == name) {
            if find_source(&source, &entry.value).is_none() {
                entry.value.push(source);
            }
            return;
        }
        self.entries.push(IndexEntry {
            key: name.to_string(),
            value: vec![source],
        });
    }

    /// Sources registered under `name`.
    pub fn get(&self, name: &str) -> &[ReferenceSource] {
        self.entries
            .iter()
            .find(|e| e.key == name)
            .map(|e| e.value.as_slice())
            .unwrap_or(&[])
    }

    /// First key under which `source` is registered.
    pub fn key_of(&self, source: &ReferenceSource) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| find_source(source, &e.value).is_some())
            .map(|e| e.key.as_str())
    }
}
