//! High-level API for the tensorlink boundary.
//!
//! Provides the safe Rust rendition of the boundary: a [`Predictor`] owns
//! one loaded model together with its bound inputs, computed outputs, and
//! flattened host-owned buffers. The C ABI crate is a thin shell over
//! this one.

#![deny(missing_docs)]
#![warn(clippy::all)]

mod buffer;
mod env;
/// Boundary error taxonomy
pub mod error;
mod flatten;
mod predictor;

pub use buffer::{OutputBuffers, TypedBuffer};
pub use env::Environment;
pub use error::{Error, Result};
pub use predictor::{Predictor, SessionOptions};

// Re-export the types callers need to talk to the boundary.
pub use tensorlink_core::{ElementType, TypeDescriptor, SUPPORTED_TYPES};
pub use tensorlink_engine::DeviceKind;
