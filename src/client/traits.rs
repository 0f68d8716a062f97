//! # Client Traits
//!
//! Interfaces the orchestrator requires from the outside world.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::errors::ApiError;
use crate::models::{FieldMap, SourceRecord, UserRemapSets};

/// Remote object-query/CRUD API of one organization
///
/// Implementations must be shareable across tasks; the orchestrator issues concurrent
/// create calls for records of the same object type.
#[async_trait]
pub trait DataApiClient: Send + Sync {
    /// Run a read query and return every matching record
    ///
    /// # Arguments
    ///
    /// * `query` - Query text produced by [`crate::query_builder::build_query`]
    async fn query(&self, query: &str) -> Result<Vec<SourceRecord>, ApiError>;

    /// Create one record and return its new identifier
    async fn create(&self, object_type: &str, fields: &FieldMap) -> Result<String, ApiError>;

    /// Update fields on an existing record
    async fn update(&self, object_type: &str, id: &str, fields: &FieldMap)
        -> Result<(), ApiError>;

    /// User the client is authenticated as, used as the default owner fallback
    fn current_user_id(&self) -> Option<String> {
        None
    }
}

/// User information gathered once per run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemap {
    pub sets: UserRemapSets,
    /// Source user id to destination user id, for users known to exist in both
    #[serde(default)]
    pub known_users: HashMap<String, String>,
}

/// Supplies the inactive/missing user sets for a run
#[async_trait]
pub trait UserRemapSource: Send + Sync {
    async fn load(&self) -> Result<UserRemap, ApiError>;
}

/// Fixed user information, e.g. read from a file prepared ahead of the run
#[derive(Debug, Clone, Default)]
pub struct StaticUserRemapSource {
    remap: UserRemap,
}

impl StaticUserRemapSource {
    pub fn new(remap: UserRemap) -> Self {
        Self { remap }
    }
}

#[async_trait]
impl UserRemapSource for StaticUserRemapSource {
    async fn load(&self) -> Result<UserRemap, ApiError> {
        Ok(self.remap.clone())
    }
}
