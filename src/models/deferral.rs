use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the referenced record a deferral is waiting for
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeferralKey {
    pub object_type: String,
    pub source_id: String,
}

impl DeferralKey {
    pub fn new(object_type: &str, source_id: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            source_id: source_id.to_string(),
        }
    }
}

impl fmt::Display for DeferralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object_type, self.source_id)
    }
}

/// A reference that was written as null and must be patched once its target is migrated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupDeferral {
    /// Object type of the record holding the reference
    pub object_type: String,
    /// Source id of the record holding the reference
    pub record_source_id: String,
    /// Destination id of the record holding the reference, bound once it is created
    pub record_destination_id: Option<String>,
    pub field_name: String,
    /// Object type the reference points at
    pub referenced_type: String,
    /// Unresolved source-environment identifier
    pub referenced_source_id: String,
}

impl LookupDeferral {
    pub fn new(
        object_type: &str,
        record_source_id: &str,
        field_name: &str,
        referenced_type: &str,
        referenced_source_id: &str,
    ) -> Self {
        Self {
            object_type: object_type.to_string(),
            record_source_id: record_source_id.to_string(),
            record_destination_id: None,
            field_name: field_name.to_string(),
            referenced_type: referenced_type.to_string(),
            referenced_source_id: referenced_source_id.to_string(),
        }
    }

    /// Attach the destination id of the record that holds the reference
    pub fn bind(mut self, destination_id: &str) -> Self {
        self.record_destination_id = Some(destination_id.to_string());
        self
    }

    pub fn key(&self) -> DeferralKey {
        DeferralKey::new(&self.referenced_type, &self.referenced_source_id)
    }

    pub fn is_self_reference(&self) -> bool {
        self.object_type.eq_ignore_ascii_case(&self.referenced_type)
    }
}

impl fmt::Display for LookupDeferral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}.{} -> {}",
            self.object_type,
            self.record_source_id,
            self.field_name,
            self.key()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_key() {
        let deferral = LookupDeferral::new("Account", "001B", "ParentId", "Account", "001A");
        assert!(deferral.record_destination_id.is_none());
        assert!(deferral.is_self_reference());

        let bound = deferral.bind("NEW-1");
        assert_eq!(bound.record_destination_id.as_deref(), Some("NEW-1"));
        assert_eq!(bound.key(), DeferralKey::new("Account", "001A"));
        assert_eq!(bound.to_string(), "Account/001B.ParentId -> Account/001A");
    }
}
