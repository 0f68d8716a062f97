use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::ID_FIELD;

/// Field name to value pairs of one record
pub type FieldMap = serde_json::Map<String, Value>;

/// One record fetched from the source organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub object_type: String,
    pub id: String,
    #[serde(default)]
    pub fields: FieldMap,
}

impl SourceRecord {
    pub fn new(object_type: &str, id: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            id: id.to_string(),
            fields: FieldMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Look up a field by API name (case-insensitive, like the remote API)
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Non-blank string value of a field
    pub fn reference_value(&self, name: &str) -> Option<String> {
        match self.field(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    /// Overwrite a field, keeping the key spelling already present on the record
    pub fn set_field(&mut self, name: &str, value: Value) {
        let key = self
            .fields
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
            .unwrap_or_else(|| name.to_string());
        self.fields.insert(key, value);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        let key = self
            .fields
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()?;
        self.fields.remove(&key)
    }

    /// Payload for a create call: every field except `Id`
    pub fn create_payload(&self) -> FieldMap {
        self.fields
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(ID_FIELD))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Blank means absent from the wire: null or whitespace-only string
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// A source record travelling through the transformer
#[derive(Debug, Clone, PartialEq)]
pub struct RecordWrapper {
    pub record: SourceRecord,
    /// Original value of the recursive relationship field when it could not be resolved yet
    pub recursive_relationship_original_id: Option<String>,
}

impl RecordWrapper {
    pub fn new(record: SourceRecord) -> Self {
        Self {
            record,
            recursive_relationship_original_id: None,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.record.id
    }

    pub fn object_type(&self) -> &str {
        &self.record.object_type
    }
}

impl From<SourceRecord> for RecordWrapper {
    fn from(record: SourceRecord) -> Self {
        Self::new(record)
    }
}
