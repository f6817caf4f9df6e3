//! Host-owned output buffers and their ownership protocol.
//!
//! Every buffer produced by a flatten belongs to an [`OutputBuffers`]
//! until the caller clears or destroys the owning context. Reads hand out
//! borrowed pointers; ownership never transfers across the boundary, so
//! each buffer's backing storage is released exactly once, by `clear` or
//! by context teardown.

use crate::error::{Error, Result};
use tensorlink_core::ElementType;
use tracing::debug;

/// A self-contained, host-readable tensor: element type, shape, and a
/// private copy of the tensor bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBuffer {
    dtype: ElementType,
    shape: Vec<i64>,
    data: Vec<u8>,
}

impl TypedBuffer {
    pub(crate) fn new(dtype: ElementType, shape: Vec<i64>, data: Vec<u8>) -> Self {
        Self { dtype, shape, data }
    }

    /// Element type of this buffer.
    pub fn dtype(&self) -> ElementType {
        self.dtype
    }

    /// Shape of this buffer.
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Tensor bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of elements.
    pub fn num_elements(&self) -> usize {
        self.shape.iter().map(|&d| d as usize).product()
    }
}

/// The ordered flattened output list of one context.
#[derive(Debug, Default)]
pub struct OutputBuffers {
    buffers: Vec<TypedBuffer>,
}

impl OutputBuffers {
    /// Number of buffers currently tracked.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Borrow a buffer by index.
    pub fn get(&self, index: usize) -> Result<&TypedBuffer> {
        self.buffers.get(index).ok_or(Error::Index {
            index,
            count: self.buffers.len(),
        })
    }

    /// Replace the tracked list with a freshly staged one; the previous
    /// buffers are released.
    pub(crate) fn commit(&mut self, staged: Vec<TypedBuffer>) {
        self.buffers = staged;
    }

    /// Release every tracked buffer. Safe to call when already empty.
    pub(crate) fn clear(&mut self) {
        if !self.buffers.is_empty() {
            debug!(released = self.buffers.len(), "releasing flattened output buffers");
        }
        self.buffers.clear();
    }
}
