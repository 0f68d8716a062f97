#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Sandboxberry
//!
//! Relationship-resolution and record-transformation engine for copying a subset of
//! records from one organization into another while preserving the references between
//! them.
//!
//! ## Overview
//!
//! Every record minted in the destination receives a new identifier, so references
//! copied verbatim would point nowhere. Sandboxberry reads a [`Manifest`] describing
//! which object types to copy and how each field behaves, orders the object types by
//! their relations, and rewrites every reference through a run-scoped
//! [`RelationMapper`]. References that cannot be resolved yet (forward references,
//! self references within a batch, cycles between types) are written as null and
//! patched once their targets exist.
//!
//! ## Module Organization
//!
//! - [`query_builder`] - Read queries for one object type
//! - [`mapping`] - Source to destination identifier table
//! - [`transform`] - Per-record field rewriting
//! - [`orchestration`] - Dependency ordering, submission, patching and reporting
//! - [`manifest`] - Migration instructions and their YAML/JSON files
//! - [`client`] - Remote data API boundary and the in-memory organization
//! - [`state_machine`] - Per-object-type lifecycle
//! - [`resilience`] - Retry with backoff for remote calls
//! - [`config`] - Run configuration
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sandboxberry::client::InMemoryOrg;
//! use sandboxberry::config::ConfigManager;
//! use sandboxberry::manifest::Manifest;
//! use sandboxberry::orchestration::MigrationOrchestrator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = Manifest::load_from_file("manifest.yaml")?;
//! let config = ConfigManager::load(None::<&str>)?;
//! let source = Arc::new(InMemoryOrg::from_snapshot_file("source", "snapshot.json")?);
//! let destination = Arc::new(InMemoryOrg::new("destination"));
//!
//! let report = MigrationOrchestrator::new(source, destination, config)
//!     .run(&manifest)
//!     .await?;
//! println!("created {} records, patched {} references", report.created, report.patched);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod mapping;
pub mod models;
pub mod orchestration;
pub mod query_builder;
pub mod resilience;
pub mod state_machine;
pub mod transform;

pub use client::{ApiError, ApiErrorKind, DataApiClient, InMemoryOrg, UserRemapSource};
pub use config::{ConfigManager, SandboxberryConfig};
pub use error::{Result, SandboxberryError};
pub use manifest::{FieldBehavior, FieldOption, Manifest, ManifestObject};
pub use mapping::RelationMapper;
pub use models::{LookupDeferral, RecordWrapper, SourceRecord};
pub use orchestration::{MigrationOrchestrator, MigrationReport};
pub use query_builder::{build_query, remove_system_columns};
pub use transform::{ObjectTransformer, TransformError};
