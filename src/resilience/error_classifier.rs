//! # Remote Error Classification
//!
//! Decides whether a failed remote call is worth repeating.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::{ApiError, ApiErrorKind};

/// Primary error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Rate limiting - retry with backoff
    RateLimit,

    /// Timeout error - retry with backoff
    Timeout,

    /// Endpoint temporarily unavailable - retry with backoff
    Transient,

    /// Permanent error - will never succeed if retried
    Permanent,
}

impl ErrorCategory {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Permanent)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit => write!(f, "Rate Limit"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Transient => write!(f, "Transient"),
            Self::Permanent => write!(f, "Permanent"),
        }
    }
}

/// Classify a remote API error
///
/// Validation, permission and not-found failures depend on the payload or the
/// credentials, so repeating the call cannot change the outcome.
pub fn classify(error: &ApiError) -> ErrorCategory {
    match error.kind {
        ApiErrorKind::RateLimited => ErrorCategory::RateLimit,
        ApiErrorKind::Timeout => ErrorCategory::Timeout,
        ApiErrorKind::Unavailable => ErrorCategory::Transient,
        ApiErrorKind::Validation
        | ApiErrorKind::Permission
        | ApiErrorKind::NotFound
        | ApiErrorKind::Other => ErrorCategory::Permanent,
    }
}
