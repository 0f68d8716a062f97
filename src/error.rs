//! Error types for the Sandboxberry engine.
//!
//! Each component owns a focused error enum; [`SandboxberryError`] is the crate-level
//! umbrella used by entry points that cross component boundaries.

use crate::client::ApiError;
use crate::config::ConfigurationError;
use crate::manifest::ManifestError;
use crate::mapping::DuplicateMappingError;
use crate::query_builder::QueryBuildError;
use crate::state_machine::StateMachineError;
use crate::transform::TransformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxberryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("Query build error: {0}")]
    QueryBuild(#[from] QueryBuildError),
    #[error("Relation mapping error: {0}")]
    Mapping(#[from] DuplicateMappingError),
    #[error("Transformation error: {0}")]
    Transform(#[from] TransformError),
    #[error("Remote API error: {0}")]
    RemoteApi(#[from] ApiError),
    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SandboxberryError>;
