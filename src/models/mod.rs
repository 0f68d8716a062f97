//! # Record Models
//!
//! Data carried through a migration run:
//!
//! - [`record`] - Source records and the transformer's per-record wrapper
//! - [`deferral`] - Pending reference patches for references not yet resolvable
//! - [`users`] - Inactive and missing user sets for owner/assignee substitution

pub mod deferral;
pub mod record;
pub mod users;

pub use deferral::{DeferralKey, LookupDeferral};
pub use record::{is_blank, FieldMap, RecordWrapper, SourceRecord};
pub use users::UserRemapSets;
