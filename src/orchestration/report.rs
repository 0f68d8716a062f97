//! # Migration Report
//!
//! Outcome of a run: counts, per-object results, failed records and orphaned deferrals.
//! Every failure is enumerated so a run can be audited after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::dependency_graph::ProcessingPlan;
use crate::mapping::MappingEntry;
use crate::models::LookupDeferral;
use crate::state_machine::{ObjectMigrationState, StateTransition};

/// Fault that stopped an object type's processing
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectFault {
    #[error("could not build query: {message}")]
    InvalidQuery { message: String },

    #[error("source query failed: {message}")]
    QueryFailed { message: String },

    #[error("duplicate relation mapping: {message}")]
    DuplicateMapping { message: String },

    #[error("cancelled before querying")]
    Cancelled,
}

/// Stage at which a single record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Transform,
    Create,
    /// Not submitted because the object type halted on a duplicate mapping
    Halted,
    Patch,
}

/// One record that did not make it to the destination intact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub object_type: String,
    pub source_id: String,
    pub stage: FailureStage,
    pub reason: String,
}

impl RecordFailure {
    pub fn new(object_type: &str, source_id: &str, stage: FailureStage, reason: impl Into<String>) -> Self {
        Self {
            object_type: object_type.to_string(),
            source_id: source_id.to_string(),
            stage,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReport {
    pub object_type: String,
    pub state: ObjectMigrationState,
    pub queried: usize,
    pub created: usize,
    /// Deferred fields on this object's records patched during the run
    pub patched: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<ObjectFault>,
    #[serde(default)]
    pub transitions: Vec<StateTransition>,
}

impl ObjectReport {
    pub fn new(object_type: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            state: ObjectMigrationState::Pending,
            queried: 0,
            created: 0,
            patched: 0,
            failed: 0,
            fault: None,
            transitions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub plan: ProcessingPlan,
    pub objects: Vec<ObjectReport>,
    pub created: usize,
    pub patched: usize,
    pub orphaned: Vec<LookupDeferral>,
    pub failed_records: Vec<RecordFailure>,
    pub cancelled: bool,
    /// Every source to destination binding known at the end of the run, sorted by key
    pub mappings: Vec<MappingEntry>,
}

impl MigrationReport {
    /// Case-insensitive lookup of an object's report
    pub fn object(&self, object_type: &str) -> Option<&ObjectReport> {
        self.objects
            .iter()
            .find(|report| report.object_type.eq_ignore_ascii_case(object_type))
    }

    pub fn failed_objects(&self) -> Vec<&ObjectReport> {
        self.objects
            .iter()
            .filter(|report| report.state == ObjectMigrationState::Failed)
            .collect()
    }

    /// No failures, no orphans, not cancelled
    pub fn is_clean(&self) -> bool {
        !self.cancelled
            && self.orphaned.is_empty()
            && self.failed_records.is_empty()
            && self
                .objects
                .iter()
                .all(|report| report.state == ObjectMigrationState::Done)
    }

    /// Destination id a source record was migrated to
    pub fn destination_id(&self, object_type: &str, source_id: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|row| {
                row.object_type.eq_ignore_ascii_case(object_type) && row.source_id == source_id.trim()
            })
            .map(|row| row.destination_id.as_str())
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
