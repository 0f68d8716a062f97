use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one object type within a migration run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectMigrationState {
    /// Waiting for the object types it depends on
    #[default]
    Pending,
    /// Reading records from the source organization
    Querying,
    /// Rewriting references for the destination
    Transforming,
    /// Creating records in the destination organization
    Submitting,
    /// Patching deferred references that became resolvable
    Patching,
    /// All records submitted and patches applied
    Done,
    /// Object-level fault (query failure, duplicate mapping)
    Failed,
    /// Run was cancelled before this object started querying
    Cancelled,
}

impl ObjectMigrationState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }

    /// Check if this is an active state (remote work in progress)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Querying | Self::Transforming | Self::Submitting | Self::Patching
        )
    }
}

impl fmt::Display for ObjectMigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Querying => write!(f, "querying"),
            Self::Transforming => write!(f, "transforming"),
            Self::Submitting => write!(f, "submitting"),
            Self::Patching => write!(f, "patching"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for ObjectMigrationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "querying" => Ok(Self::Querying),
            "transforming" => Ok(Self::Transforming),
            "submitting" => Ok(Self::Submitting),
            "patching" => Ok(Self::Patching),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid object migration state: {s}")),
        }
    }
}
