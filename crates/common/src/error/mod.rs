//! Common error types shared by the session crates
//!
//! Module-specific errors (OAuth client, session controller, keychain)
//! compose with [`CommonError`] rather than duplicating its variants. Every
//! error type implements [`ErrorClassification`]; the session controller
//! picks the log level of a swallowed failure from its severity.
//!
//! | Pattern | CommonError Variant |
//! |---------|---------------------|
//! | **Configuration** | `Config` |
//! | **Durable storage** | `Storage` |
//! | **External capability** | `Backend` |
//! | **Internal** | `Internal` |
//!
//! ## Example
//!
//! ```rust
//! use tokenflow_common::error::{CommonError, ErrorClassification, ErrorSeverity};
//!
//! let err = CommonError::storage_op("getItem", "keychain locked");
//! assert_eq!(err.severity(), ErrorSeverity::Error);
//! assert!(!err.is_retryable());
//! ```

use std::fmt;

/// Standard result type using `CommonError`
pub type CommonResult<T> = Result<T, CommonError>;

/// Common error variants that appear across multiple modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// Configuration-related errors
    Config { message: String, field: Option<String> },

    /// Durable key-value storage errors
    Storage { message: String, operation: Option<String> },

    /// An external capability (browser, platform service) failed
    Backend { service: String, message: String, is_retryable: bool },

    /// Internal errors that shouldn't normally occur
    Internal { message: String, context: Option<String> },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message, field } => {
                if let Some(field) = field {
                    write!(f, "Configuration error in field '{field}': {message}")
                } else {
                    write!(f, "Configuration error: {message}")
                }
            }
            Self::Storage { message, operation } => {
                if let Some(op) = operation {
                    write!(f, "Storage error during '{op}': {message}")
                } else {
                    write!(f, "Storage error: {message}")
                }
            }
            Self::Backend { service, message, .. } => {
                write!(f, "Backend error from '{service}': {message}")
            }
            Self::Internal { message, context } => {
                if let Some(ctx) = context {
                    write!(f, "Internal error in '{ctx}': {message}")
                } else {
                    write!(f, "Internal error: {message}")
                }
            }
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend { is_retryable: true, .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } | Self::Storage { .. } | Self::Backend { .. } => {
                ErrorSeverity::Error
            }
            Self::Internal { .. } => ErrorSeverity::Critical,
        }
    }
}

impl CommonError {
    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a storage error for a specific operation
    pub fn storage_op<S: Into<String>, O: Into<String>>(operation: O, message: S) -> Self {
        Self::Storage { message: message.into(), operation: Some(operation.into()) }
    }

    /// Create a backend error
    pub fn backend<S: Into<String>, M: Into<String>>(
        service: S,
        message: M,
        is_retryable: bool,
    ) -> Self {
        Self::Backend { service: service.into(), message: message.into(), is_retryable }
    }

    /// Create an internal error with context
    pub fn internal_with_context<S: Into<String>, C: Into<String>>(message: S, context: C) -> Self {
        Self::Internal { message: message.into(), context: Some(context.into()) }
    }
}

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Can the failed operation be retried as-is?
    fn is_retryable(&self) -> bool;

    /// Severity used for log level selection
    fn severity(&self) -> ErrorSeverity;
}

/// Error severity levels, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected condition, logged at `debug`
    Info,
    /// Degraded but recoverable, logged at `warn`
    Warning,
    /// Failure needing attention, logged at `error`
    Error,
    /// Broken invariant, logged at `error`
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
