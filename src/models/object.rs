use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One record of a container listing (`?format=json`).
///
/// The server's record is kept exactly as received. Well-known fields are
/// read through accessors, which return `None` when a field is absent, `null`,
/// or of an unexpected type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ObjectEntry {
    name: String,
    record: Map<String, Value>,
}

impl ObjectEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MD5 of the object content
    pub fn hash(&self) -> Option<&str> {
        self.get_str("hash")
    }

    /// Object size in bytes
    pub fn bytes(&self) -> Option<u64> {
        self.record.get("bytes").and_then(Value::as_u64)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get_str("content_type")
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.get_str("last_modified")
    }

    /// Raw value of any field of the record
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }

    /// The full record as sent by the server
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    pub fn into_record(self) -> Map<String, Value> {
        self.record
    }

    fn get_str(&self, field: &str) -> Option<&str> {
        self.record.get(field).and_then(Value::as_str)
    }
}

impl TryFrom<Map<String, Value>> for ObjectEntry {
    type Error = String;

    fn try_from(record: Map<String, Value>) -> Result<Self, Self::Error> {
        let name = match record.get("name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => return Err(format!("listing entry name is not a string: {}", other)),
            None => return Err("listing entry without a name".to_string()),
        };
        Ok(Self { name, record })
    }
}

impl From<ObjectEntry> for Map<String, Value> {
    fn from(entry: ObjectEntry) -> Self {
        entry.record
    }
}

/// Key listing entries by object name. Later duplicates win.
pub fn index_by_name(entries: Vec<ObjectEntry>) -> HashMap<String, ObjectEntry> {
    entries
        .into_iter()
        .map(|entry| (entry.name.clone(), entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_entry() {
        let raw = json!({
            "name": "2024/photo.jpg",
            "hash": "5eb63bbbe01eeed093cb22bb8f5acdc3",
            "bytes": 11,
            "content_type": "image/jpeg",
            "last_modified": "2024-03-01T12:00:00.000000",
            "downloaded": 7
        });

        let entry: ObjectEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.name(), "2024/photo.jpg");
        assert_eq!(entry.hash(), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
        assert_eq!(entry.bytes(), Some(11));
        assert_eq!(entry.content_type(), Some("image/jpeg"));
        assert_eq!(entry.last_modified(), Some("2024-03-01T12:00:00.000000"));
        assert_eq!(entry.get("downloaded"), Some(&json!(7)));

        // Full record survives
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn test_parse_minimal_entry() {
        let entry: ObjectEntry = serde_json::from_value(json!({"name": "a.txt"})).unwrap();
        assert_eq!(entry.name(), "a.txt");
        assert!(entry.hash().is_none());
        assert!(entry.bytes().is_none());
        assert_eq!(entry.record().len(), 1);
    }

    #[test]
    fn test_null_fields_are_kept() {
        let raw = json!({"name": "a.txt", "hash": null, "bytes": 3});

        let entry: ObjectEntry = serde_json::from_value(raw.clone()).unwrap();
        assert!(entry.hash().is_none());
        assert_eq!(entry.get("hash"), Some(&Value::Null));

        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn test_unexpected_field_types_are_tolerated() {
        let raw = json!({"name": "a.txt", "bytes": "11", "content_type": 5});

        let entry: ObjectEntry = serde_json::from_value(raw.clone()).unwrap();
        assert!(entry.bytes().is_none());
        assert!(entry.content_type().is_none());
        assert_eq!(entry.get("bytes"), Some(&json!("11")));
        assert_eq!(entry.into_record(), raw.as_object().unwrap().clone());
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let result: Result<ObjectEntry, _> = serde_json::from_value(json!({"bytes": 1}));
        assert!(result.is_err());

        let result: Result<ObjectEntry, _> = serde_json::from_value(json!({"name": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_index_by_name() {
        let entries: Vec<ObjectEntry> =
            serde_json::from_value(json!([{"name": "a.txt"}, {"name": "b.txt", "bytes": 3}]))
                .unwrap();

        let index = index_by_name(entries);
        assert_eq!(index.len(), 2);
        assert_eq!(index["a.txt"].name(), "a.txt");
        assert_eq!(index["b.txt"].bytes(), Some(3));
    }
}
