//! Error types for the tensorlink-engine crate.

use crate::device::DeviceKind;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Model file could not be read.
    #[error("model file: {0}")]
    Io(#[from] std::io::Error),

    /// Model file is not a well-formed manifest.
    #[error("manifest parse error: {0}")]
    Parse(String),

    /// Manifest is structurally invalid.
    #[error("manifest validation: {0}")]
    Validation(String),

    /// Requested device is not available in this build.
    #[error("device {0} is not available in this build")]
    DeviceUnavailable(DeviceKind),

    /// Graph execution failed.
    #[error("execution: {0}")]
    Execution(String),

    /// Profiling collaborator failure.
    #[error("profiling: {0}")]
    Profiling(String),

    /// Error from the core value model.
    #[error("core error: {0}")]
    Core(#[from] tensorlink_core::CoreError),
}
