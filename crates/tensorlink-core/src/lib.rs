//! tensorlink core types
//!
//! This crate provides the foundational pieces of the tensorlink boundary:
//! the element-type dispatch table, the recursive value model exchanged
//! with the inference engine, and logging setup.
//!
//! ## Architecture
//!
//! - **dtype**: element-type tags and the static descriptor table that
//!   decides which kinds the boundary can marshal
//! - **value**: owned tensors, borrowed tensor views, and the
//!   tensor/sequence/map value tree
//! - **logging**: `tracing`-based logging configuration
//!
//! ## Example
//!
//! ```rust
//! use tensorlink_core::{ElementType, TensorData};
//!
//! let tensor = TensorData::from_f32(vec![1, 3], &[1.0, 2.0, 3.0])?;
//! assert_eq!(tensor.dtype(), ElementType::F32);
//! assert_eq!(tensor.num_elements(), 3);
//! # Ok::<(), tensorlink_core::CoreError>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
/// Error types for core operations
pub mod error;
pub mod logging;
pub mod value;

pub use dtype::{ElementType, TypeDescriptor, SUPPORTED_TYPES};
pub use error::{CoreError, Result};
pub use logging::{init_default_logging, init_logging, LogLevel, LoggingConfig};
pub use value::{num_elements, MapKey, TensorData, TensorView, Value};
