//! Boundary error taxonomy.
//!
//! Every failure that can cross the boundary is one of these variants;
//! the capi layer reduces them to a message string in the last-error slot.

use thiserror::Error;

/// Result type for boundary operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported across the boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Model file missing, unreadable, or malformed.
    #[error("load error: {0}")]
    Load(String),

    /// Requested accelerator is not available in this build.
    #[error("unsupported device: {0}")]
    UnsupportedDevice(String),

    /// Element kind outside the closed supported set, at bind or flatten
    /// time.
    #[error("unsupported element type: {0}")]
    UnsupportedType(String),

    /// Null, destroyed, or busy context handle.
    #[error("invalid context: {0}")]
    InvalidContext(String),

    /// Malformed argument at the boundary (null pointer, bad rank).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input-count mismatch or engine failure during execution.
    #[error("execution error: {0}")]
    Execution(String),

    /// Output index outside the flattened list.
    #[error("output index {index} out of range for {count} outputs")]
    Index {
        /// Requested index.
        index: usize,
        /// Current flattened output count.
        count: usize,
    },

    /// Profiling artifact unreadable.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
