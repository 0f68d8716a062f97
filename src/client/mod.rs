//! # Remote Data API Boundary
//!
//! The engine talks to both organizations through the [`DataApiClient`] trait and learns
//! about unusable users through [`UserRemapSource`]. Transport (SOAP, REST) is the
//! implementor's concern.
//!
//! [`InMemoryOrg`] is a complete in-process organization used for rehearsal runs and
//! the test suites.

pub mod errors;
pub mod memory;
pub mod traits;

pub use errors::{ApiError, ApiErrorKind};
pub use memory::{InMemoryOrg, OrgOperation, StoredRecord};
pub use traits::{DataApiClient, StaticUserRemapSource, UserRemap, UserRemapSource};
