//! tensorlink inference engine
//!
//! The "native engine" side of the tensorlink boundary: model loading and
//! validation, synchronous graph execution over the core value model,
//! device gating, and the per-session profiling collaborator.
//!
//! The boundary crates consume this one through a deliberately narrow
//! surface: [`Model::load`], [`Model::run`], and [`Profiler`]. Everything
//! else is an implementation detail of the engine.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod device;
/// Error types for engine operations
pub mod error;
mod executor;
pub mod manifest;
pub mod model;
pub mod profiling;

pub use device::DeviceKind;
pub use error::{EngineError, Result};
pub use manifest::{Manifest, NodeDecl, SlotDecl, MANIFEST_VERSION};
pub use model::Model;
pub use profiling::{ProfileConfig, ProfileEvent, Profiler};
