use serde::{Deserialize, Serialize};

use super::ManifestError;

/// Transformation applied to a single field while copying a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldBehavior {
    /// Value copied verbatim
    PassThrough,
    /// Reference to another object type, rewritten through the relation mapper
    Relation { references: String },
    /// Reference to a user, subject to missing/inactive user substitution
    User,
    /// Reference to another record of the same object type
    Recursive,
    /// Field is neither queried nor written
    Skip,
}

impl FieldBehavior {
    /// Name used in manifest documents
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::Relation { .. } => "relation",
            Self::User => "user",
            Self::Recursive => "recursive",
            Self::Skip => "skip",
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Relation { .. } | Self::User | Self::Recursive)
    }
}

/// Per-field option of a manifest object (field name + behavior)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldOption", into = "RawFieldOption")]
pub struct FieldOption {
    pub name: String,
    pub behavior: FieldBehavior,
    /// Record creation is impossible while this field is null
    pub required: bool,
}

impl FieldOption {
    pub fn pass_through(name: &str) -> Self {
        Self::new(name, FieldBehavior::PassThrough)
    }

    pub fn relation(name: &str, references: &str) -> Self {
        Self::new(
            name,
            FieldBehavior::Relation {
                references: references.to_string(),
            },
        )
    }

    pub fn user(name: &str) -> Self {
        Self::new(name, FieldBehavior::User)
    }

    pub fn recursive(name: &str) -> Self {
        Self::new(name, FieldBehavior::Recursive)
    }

    pub fn skip(name: &str) -> Self {
        Self::new(name, FieldBehavior::Skip)
    }

    pub fn new(name: &str, behavior: FieldBehavior) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            required: false,
        }
    }

    /// Mark the field as required for record creation
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// On-disk shape of a field option
///
/// ```yaml
/// - name: AccountId
///   behavior: relation
///   references: Account
///   required: true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFieldOption {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    behavior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    references: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    required: bool,
}

impl TryFrom<RawFieldOption> for FieldOption {
    type Error = ManifestError;

    fn try_from(raw: RawFieldOption) -> Result<Self, Self::Error> {
        let behavior = match raw.behavior.as_deref().unwrap_or("pass_through") {
            "pass_through" => FieldBehavior::PassThrough,
            "user" => FieldBehavior::User,
            "recursive" => FieldBehavior::Recursive,
            "skip" => FieldBehavior::Skip,
            "relation" => {
                let references = raw
                    .references
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| ManifestError::MissingRelationTarget {
                        field: raw.name.clone(),
                    })?;
                FieldBehavior::Relation { references }
            }
            other => {
                return Err(ManifestError::UnknownBehavior {
                    field: raw.name.clone(),
                    behavior: other.to_string(),
                })
            }
        };

        Ok(Self {
            name: raw.name,
            behavior,
            required: raw.required,
        })
    }
}

impl From<FieldOption> for RawFieldOption {
    fn from(option: FieldOption) -> Self {
        let behavior = match option.behavior {
            FieldBehavior::PassThrough => None,
            ref other => Some(other.kind().to_string()),
        };
        let references = match option.behavior {
            FieldBehavior::Relation { references } => Some(references),
            _ => None,
        };

        Self {
            name: option.name,
            behavior,
            references,
            required: option.required,
        }
    }
}
