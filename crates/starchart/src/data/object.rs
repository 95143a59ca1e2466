use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::reference::ReferenceSource;

/// Commit metadata attached to records and changelog entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitData {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Raw record exactly as stored by the data pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub line: u32,
    pub data: Value,
    #[serde(default)]
    pub removed: Option<CommitData>,
    #[serde(default, rename = "lastCommit")]
    pub last_commit: Option<String>,
}

/// A raw record together with the key it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectData {
    pub id: ReferenceSource,
    pub record: RecordData,
    pub display_name: String,
}

impl ObjectData {
    pub fn new(id: ReferenceSource, record: RecordData) -> Self {
        let display_name = record
            .data
            .get("display name")
            .or_else(|| record.data.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| id.name.clone())
            .unwrap_or_default();
        Self {
            id,
            record,
            display_name,
        }
    }

    /// Parse a record from its JSON text.
    pub fn from_json(id: ReferenceSource, json: &str) -> Result<Self, serde_json::Error> {
        let record: RecordData = serde_json::from_str(json)?;
        Ok(Self::new(id, record))
    }

    pub fn source(&self) -> &ReferenceSource {
        &self.id
    }

    pub fn data(&self) -> &Value {
        &self.record.data
    }

    /// Source file and line of the definition.
    pub fn location(&self) -> (&str, u32) {
        (&self.record.filename, self.record.line)
    }

    pub fn is_removed(&self) -> bool {
        self.record.removed.is_some()
    }

    pub fn removed_commit(&self) -> Option<&CommitData> {
        self.record.removed.as_ref()
    }

    pub fn last_commit(&self) -> Option<&str> {
        self.record.last_commit.as_deref()
    }
}

/// One diff hunk of a changelog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffData {
    #[serde(default)]
    pub added: bool,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub diff: String,
}

/// One change to an entity's definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeData {
    #[serde(default)]
    pub diff: DiffData,
    #[serde(default)]
    pub commit: CommitData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_explicit() {
        let json = r#"{ "filename": "map.txt", "line": 12,
            "data": { "name": "Earth", "display name": "Terra" } }"#;
        let data = ObjectData::from_json(ReferenceSource::new("planet", "Earth"), json).unwrap();
        assert_eq!(data.display_name, "Terra");
        assert_eq!(data.location(), ("map.txt", 12));
        assert!(!data.is_removed());
    }

    #[test]
    fn display_name_falls_back_to_reference() {
        let json = r#"{ "data": {}, "removed": { "hash": "abc" }, "lastCommit": "def" }"#;
        let data = ObjectData::from_json(ReferenceSource::new("planet", "Mars"), json).unwrap();
        assert_eq!(data.display_name, "Mars");
        assert!(data.is_removed());
        assert_eq!(data.removed_commit().map(|c| c.hash.as_str()), Some("abc"));
        assert_eq!(data.last_commit(), Some("def"));
    }

    #[test]
    fn changelog_parses() {
        let json = r#"[{ "diff": { "added": true, "diff": "+ link Vega" },
                         "commit": { "hash": "123", "message": "Add link" } }]"#;
        let changes: Vec<ChangeData> = serde_json::from_str(json).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].diff.added);
        assert_eq!(changes[0].commit.message.as_deref(), Some("Add link"));
    }
}
