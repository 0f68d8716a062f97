use thiserror::Error;

/// Per-record transformation faults
///
/// These never abort the object type's batch; the orchestrator skips the record and
/// reports it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{object_type}/{source_id}: required field {field_name} cannot be resolved ({reason})")]
    RequiredFieldUnresolvable {
        object_type: String,
        source_id: String,
        field_name: String,
        reason: String,
    },

    #[error("record {source_id} is a {actual}, transformer handles {expected}")]
    ObjectMismatch {
        expected: String,
        actual: String,
        source_id: String,
    },
}

impl TransformError {
    pub fn required_field_unresolvable(
        object_type: &str,
        source_id: &str,
        field_name: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::RequiredFieldUnresolvable {
            object_type: object_type.to_string(),
            source_id: source_id.to_string(),
            field_name: field_name.to_string(),
            reason: reason.into(),
        }
    }
}
