use serde::{Deserialize, Serialize};

/// Events that drive an object type through its migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ObjectMigrationEvent {
    /// Dependencies satisfied, start reading source records
    StartQuery,
    /// Source records received
    RecordsFetched(usize),
    /// Transformation finished, start creating records
    Submit,
    /// Every submission finished (successfully or not)
    SubmissionsComplete,
    /// Deferred reference patching finished
    Complete,
    /// Object-level failure with reason
    Fail(String),
    /// Run cancelled
    Cancel,
}

impl ObjectMigrationEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StartQuery => "start_query",
            Self::RecordsFetched(_) => "records_fetched",
            Self::Submit => "submit",
            Self::SubmissionsComplete => "submissions_complete",
            Self::Complete => "complete",
            Self::Fail(_) => "fail",
            Self::Cancel => "cancel",
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }

    /// Create a failure event with the given error message
    pub fn fail_with_error(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}
