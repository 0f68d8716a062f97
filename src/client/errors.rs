use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure class reported by the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Request quota exceeded
    RateLimited,
    /// Call did not complete in time
    Timeout,
    /// Endpoint temporarily unreachable
    Unavailable,
    /// Payload rejected by the destination (required field, bad value, trigger)
    Validation,
    /// Credentials lack access to the object or field
    Permission,
    /// Target record or object type does not exist
    NotFound,
    /// Anything the transport could not classify
    Other,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Timeout => write!(f, "timeout"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::Validation => write!(f, "validation"),
            Self::Permission => write!(f, "permission"),
            Self::NotFound => write!(f, "not_found"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Error returned by query, create and update calls
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} error during {operation}: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub operation: String,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, operation: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn rate_limited(operation: &str, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::RateLimited, operation, message)
    }

    pub fn timeout(operation: &str, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, operation, message)
    }

    pub fn validation(operation: &str, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Validation, operation, message)
    }

    pub fn permission(operation: &str, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Permission, operation, message)
    }

    pub fn not_found(operation: &str, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, operation, message)
    }
}
