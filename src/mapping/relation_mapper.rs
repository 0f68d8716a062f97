//! # Relation Mapper
//!
//! Records, for each `(object type, source id)` pair, the destination id created for it.
//!
//! Entries are write-once: a key is bound to exactly one destination id for the life of
//! the run and is never removed, so the mapper doubles as the "already migrated" ledger.
//! The table is a sharded concurrent map; registration goes through the entry API,
//! which holds the shard lock for the key while the binding is checked and stored, so
//! two workers can never bind one source record to two destination ids.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Normalized lookup key; object type names compare case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationKey {
    pub object_type: String,
    pub source_id: String,
}

impl RelationKey {
    pub fn new(object_type: &str, source_id: &str) -> Self {
        Self {
            object_type: object_type.to_ascii_lowercase(),
            source_id: source_id.trim().to_string(),
        }
    }
}

/// A source record was bound to two different destination records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Source record {object_type}/{source_id} is already mapped to '{existing_destination_id}', refusing to remap it to '{attempted_destination_id}'"
)]
pub struct DuplicateMappingError {
    pub object_type: String,
    pub source_id: String,
    pub existing_destination_id: String,
    pub attempted_destination_id: String,
}

/// Flattened mapping row used in reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub object_type: String,
    pub source_id: String,
    pub destination_id: String,
}

#[derive(Debug, Default)]
pub struct RelationMapper {
    entries: DashMap<RelationKey, String>,
}

impl RelationMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `(object_type, source_id)` to `destination_id`.
    ///
    /// Re-registering the same binding succeeds so retried submissions stay harmless.
    pub fn register(
        &self,
        object_type: &str,
        source_id: &str,
        destination_id: &str,
    ) -> Result<(), DuplicateMappingError> {
        match self.entries.entry(RelationKey::new(object_type, source_id)) {
            Entry::Occupied(existing) => {
                if existing.get() == destination_id {
                    debug!(
                        object_type = %object_type,
                        source_id = %source_id,
                        destination_id = %destination_id,
                        "Idempotent re-registration"
                    );
                    Ok(())
                } else {
                    let err = DuplicateMappingError {
                        object_type: object_type.to_string(),
                        source_id: source_id.to_string(),
                        existing_destination_id: existing.get().clone(),
                        attempted_destination_id: destination_id.to_string(),
                    };
                    Err(err)
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(destination_id.to_string());
                Ok(())
            }
        }
    }

    /// Destination id for a source record, or `None` when it has not been migrated (yet)
    pub fn resolve(&self, object_type: &str, source_id: &str) -> Option<String> {
        self.entries
            .get(&RelationKey::new(object_type, source_id))
            .map(|entry| entry.value().clone())
    }

    /// Register a batch of known bindings (e.g. user ids matched by username)
    pub fn preload<I>(&self, object_type: &str, pairs: I) -> Result<usize, DuplicateMappingError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut loaded = 0;
        for (source_id, destination_id) in pairs {
            self.register(object_type, &source_id, &destination_id)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted copy of every mapping
    pub fn snapshot(&self) -> Vec<MappingEntry> {
        let mut rows: Vec<MappingEntry> = self
            .entries
            .iter()
            .map(|entry| MappingEntry {
                object_type: entry.key().object_type.clone(),
                source_id: entry.key().source_id.clone(),
                destination_id: entry.value().clone(),
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.object_type.as_str(), a.source_id.as_str())
                .cmp(&(b.object_type.as_str(), b.source_id.as_str()))
        });
        rows
    }
}
