//! # Relation Mapping
//!
//! Run-scoped translation table from source-environment identifiers to the identifiers
//! minted in the destination environment.

pub mod relation_mapper;

pub use relation_mapper::{DuplicateMappingError, MappingEntry, RelationKey, RelationMapper};
