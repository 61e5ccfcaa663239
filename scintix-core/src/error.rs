//! Error types for scintix-core.
//!
//! The event path itself never fails; only configuration loading and
//! validation produce errors.

use thiserror::Error;

/// Result type alias for scintix operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for scintix operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is out of its allowed range.
    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for the expected schema.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
