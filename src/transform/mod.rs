//! # Object Transformer
//!
//! Rewrites source records into destination-ready payloads, one manifest object at a time.
//!
//! Each configured field option is dispatched on its [`FieldBehavior`](crate::manifest::FieldBehavior):
//! pass-through values are copied, relation and user references are rewritten through the
//! [`RelationMapper`](crate::mapping::RelationMapper), and references that cannot be resolved
//! yet are written as null and returned as [`LookupDeferral`](crate::models::LookupDeferral)s
//! for the orchestrator to patch later.
//!
//! Transformation is synchronous and CPU-only. A transformer reads only its manifest
//! object and the (internally synchronized) mapper, so records of one object type can be
//! transformed from many tasks at once.

pub mod errors;
pub mod object_transformer;

pub use errors::TransformError;
pub use object_transformer::{ObjectTransformer, TransformOutcome, TransformedRecord, UserFallbackPolicy};
