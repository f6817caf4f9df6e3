//! Error types for the tensorlink-core crate.

use crate::dtype::ElementType;
use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the core value model.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Element type outside the supported dispatch table.
    #[error("unsupported element type: {0}")]
    UnsupportedType(ElementType),

    /// Wire tag that does not name any element type.
    #[error("unknown element type tag: {0}")]
    UnknownTypeTag(i32),

    /// Type name that does not match any canonical element type.
    #[error("unknown element type name: {0:?}")]
    UnknownTypeName(String),

    /// Tensor byte storage does not match shape and element width.
    #[error(
        "tensor byte length mismatch: got {actual} bytes, shape {shape:?} of {dtype} needs {expected}"
    )]
    ByteLengthMismatch {
        /// Element type of the tensor.
        dtype: ElementType,
        /// Declared shape.
        shape: Vec<i64>,
        /// Bytes required by shape and element width.
        expected: usize,
        /// Bytes actually provided.
        actual: usize,
    },

    /// Shape with a negative dimension or an overflowing element count.
    #[error("invalid tensor shape: {0}")]
    InvalidShape(String),
}
