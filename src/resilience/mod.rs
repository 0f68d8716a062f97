//! # Resilience Module
//!
//! Retry handling for remote API calls.
//!
//! ## Architecture
//!
//! - **Classification**: [`classify`] maps an [`ApiErrorKind`](crate::client::ApiErrorKind)
//!   to an [`ErrorCategory`] that says whether a retry can help
//! - **Backoff**: [`RetryPolicy`] computes capped exponential delays with optional jitter
//!   and drives an async operation until it succeeds, fails permanently, or runs out of attempts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sandboxberry::client::{DataApiClient, InMemoryOrg};
//! use sandboxberry::config::RetryConfig;
//! use sandboxberry::resilience::RetryPolicy;
//!
//! # async fn example(org: InMemoryOrg) -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::from_config(&RetryConfig::default());
//! let rows = policy
//!     .run("query Account", || org.query("select Id from Account"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod error_classifier;
pub mod retry;

pub use error_classifier::{classify, ErrorCategory};
pub use retry::RetryPolicy;
