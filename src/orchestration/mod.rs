//! # Migration Orchestration
//!
//! Run-level coordination: dependency ordering, the deferral queue, cancellation and the
//! final report. [`MigrationOrchestrator::run`] is the entry point.

pub mod cancellation;
pub mod deferral_queue;
pub mod dependency_graph;
pub mod migration_orchestrator;
pub mod report;

pub use cancellation::CancellationFlag;
pub use deferral_queue::{DeferralQueue, ResolvedDeferral};
pub use dependency_graph::{DependencyGraph, ProcessingPlan};
pub use migration_orchestrator::MigrationOrchestrator;
pub use report::{FailureStage, MigrationReport, ObjectFault, ObjectReport, RecordFailure};
