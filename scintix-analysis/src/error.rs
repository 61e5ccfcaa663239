//! Analysis error types.

use scintix_core::Channel;
use thiserror::Error;

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Analysis error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Histogram booking with unusable binning.
    #[error("invalid binning for `{title}`: {reason}")]
    InvalidBinning {
        /// Histogram title.
        title: String,
        /// Why the binning was rejected.
        reason: String,
    },

    /// Two histograms with different binning were merged.
    #[error("cannot merge histograms with different binning: `{0}`")]
    BinningMismatch(String),

    /// A channel was booked twice.
    #[error("channel {} booked twice", .0.index())]
    DuplicateChannel(Channel),

    /// Booking file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Booking file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] scintix_core::Error),
}
