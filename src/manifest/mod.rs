//! # Manifest Model
//!
//! In-memory representation of the migration instructions: which object types to copy,
//! which fields to read for each, how every field is transformed, and which records
//! are selected. A manifest is loaded once before a run and never mutated during it.
//!
//! ```yaml
//! objects:
//!   - api_name: Account
//!     filter: "Help_Sandbox_Data_Set__c = true"
//!     fields:
//!       - name: Name
//!       - name: ParentId
//!         behavior: recursive
//!       - name: OwnerId
//!         behavior: user
//!   - api_name: Contact
//!     fields:
//!       - name: LastName
//!       - name: AccountId
//!         behavior: relation
//!         references: Account
//!         required: true
//! ```

pub mod field_option;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::ID_FIELD;
use crate::query_builder::remove_system_columns;

pub use field_option::{FieldBehavior, FieldOption};

/// Manifest loading and validation errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write manifest '{path}': {error}")]
    FileWrite { path: String, error: String },

    #[error("Invalid manifest document '{source_name}': {error}")]
    Parse { source_name: String, error: String },

    #[error("Unsupported manifest format '{extension}' (expected yaml, yml or json)")]
    UnsupportedFormat { extension: String },

    #[error("Field '{field}' is a relation but names no referenced object type")]
    MissingRelationTarget { field: String },

    #[error("Field '{field}' has unknown behavior '{behavior}'")]
    UnknownBehavior { field: String, behavior: String },

    #[error("Manifest validation failed: {reason}")]
    Invalid { reason: String },
}

/// Complete set of migration instructions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub objects: Vec<ManifestObject>,
}

/// Instructions for a single object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestObject {
    pub api_name: String,

    #[serde(default)]
    pub fields: Vec<FieldOption>,

    /// Predicate ANDed into the read query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Object types that must be migrated before this one, beyond those implied by relation fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u32>,
}

impl ManifestObject {
    pub fn new(api_name: &str) -> Self {
        Self {
            api_name: api_name.to_string(),
            fields: Vec::new(),
            filter: None,
            depends_on: Vec::new(),
            row_limit: None,
        }
    }

    pub fn with_field(mut self, option: FieldOption) -> Self {
        self.fields.push(option);
        self
    }

    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    pub fn with_dependency(mut self, object_type: &str) -> Self {
        self.depends_on.push(object_type.to_string());
        self
    }

    pub fn with_row_limit(mut self, row_limit: u32) -> Self {
        self.row_limit = Some(row_limit);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldOption> {
        self.fields
            .iter()
            .find(|option| option.name.eq_ignore_ascii_case(name))
    }

    /// The field declared as this object's self reference, if any
    pub fn recursive_field(&self) -> Option<&FieldOption> {
        self.fields
            .iter()
            .find(|option| option.behavior == FieldBehavior::Recursive)
    }

    /// Object types this object must wait for, excluding itself
    ///
    /// Relation fields pointing at the object's own type are treated as recursive.
    pub fn dependencies(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .filter_map(|option| match &option.behavior {
                FieldBehavior::Relation { references } => Some(references.clone()),
                _ => None,
            })
            .chain(self.depends_on.iter().cloned())
            .filter(|object_type| !object_type.eq_ignore_ascii_case(&self.api_name))
            .filter(|object_type| seen.insert(object_type.to_ascii_lowercase()))
            .collect()
    }

    /// Columns to read for this object: `Id` first, then every non-skipped field
    pub fn queryable_columns(&self) -> Vec<String> {
        let mut columns = vec![ID_FIELD.to_string()];
        columns.extend(
            self.fields
                .iter()
                .filter(|option| option.behavior != FieldBehavior::Skip)
                .filter(|option| !option.name.eq_ignore_ascii_case(ID_FIELD))
                .map(|option| option.name.clone()),
        );
        remove_system_columns(&columns)
    }
}

impl Manifest {
    pub fn new(objects: Vec<ManifestObject>) -> Self {
        Self { objects }
    }

    /// Starter manifest listing the given object types with no field options
    pub fn starter<S: AsRef<str>>(object_names: &[S]) -> Self {
        Self {
            objects: object_names
                .iter()
                .map(|name| ManifestObject::new(name.as_ref()))
                .collect(),
        }
    }

    pub fn object(&self, api_name: &str) -> Option<&ManifestObject> {
        self.objects
            .iter()
            .find(|object| object.api_name.eq_ignore_ascii_case(api_name))
    }

    pub fn object_names(&self) -> Vec<&str> {
        self.objects.iter().map(|o| o.api_name.as_str()).collect()
    }

    /// Structural validation performed once after loading
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut names = HashSet::new();

        for object in &self.objects {
            if object.api_name.trim().is_empty() {
                return Err(ManifestError::Invalid {
                    reason: "object with empty api_name".to_string(),
                });
            }
            if !names.insert(object.api_name.to_ascii_lowercase()) {
                return Err(ManifestError::Invalid {
                    reason: format!("object '{}' is listed more than once", object.api_name),
                });
            }

            let recursive_fields = object
                .fields
                .iter()
                .filter(|option| option.behavior == FieldBehavior::Recursive)
                .count();
            if recursive_fields > 1 {
                return Err(ManifestError::Invalid {
                    reason: format!(
                        "object '{}' declares {recursive_fields} recursive fields, at most one is allowed",
                        object.api_name
                    ),
                });
            }

            let mut field_names = HashSet::new();
            for option in &object.fields {
                if option.name.trim().is_empty() {
                    return Err(ManifestError::Invalid {
                        reason: format!("object '{}' has a field with no name", object.api_name),
                    });
                }
                if !field_names.insert(option.name.to_ascii_lowercase()) {
                    return Err(ManifestError::Invalid {
                        reason: format!(
                            "field '{}' is configured twice on '{}'",
                            option.name, object.api_name
                        ),
                    });
                }
                if option.required && option.behavior == FieldBehavior::Skip {
                    return Err(ManifestError::Invalid {
                        reason: format!(
                            "field '{}' on '{}' cannot be both required and skipped",
                            option.name, object.api_name
                        ),
                    });
                }
            }
        }

        Ok(())
    }
}
