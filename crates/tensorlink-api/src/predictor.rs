//! The predictor: one loaded model plus its bound inputs, computed
//! outputs, and flattened buffers.

use crate::buffer::{OutputBuffers, TypedBuffer};
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::flatten::flatten_outputs;
use std::path::{Path, PathBuf};
use std::slice;
use tensorlink_core::{num_elements, CoreError, ElementType, TensorView, Value};
use tensorlink_engine::{DeviceKind, EngineError, Model, ProfileConfig, Profiler};
use tracing::{debug, info};

/// Options for creating a predictor.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    device: DeviceKind,
    enable_profiling: bool,
    profile_prefix: String,
    profile_dir: Option<PathBuf>,
}

impl SessionOptions {
    /// Create new session options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution device.
    pub fn with_device(mut self, device: DeviceKind) -> Self {
        self.device = device;
        self
    }

    /// Enable or disable profiling for this session.
    pub fn with_profiling(mut self, enable: bool) -> Self {
        self.enable_profiling = enable;
        self
    }

    /// Set the profiling artifact file name prefix.
    pub fn with_profile_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.profile_prefix = prefix.into();
        self
    }

    /// Set the directory profiling artifacts are written into.
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }

    /// Get the execution device.
    pub fn device(&self) -> DeviceKind {
        self.device
    }

    fn profile_config(&self) -> ProfileConfig {
        ProfileConfig {
            enabled: self.enable_profiling,
            prefix: self.profile_prefix.clone(),
            dir: self
                .profile_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            device: DeviceKind::Cpu,
            enable_profiling: true,
            profile_prefix: "tensorlink".to_string(),
            profile_dir: None,
        }
    }
}

/// One positional input binding: a typed view over caller-owned bytes.
#[derive(Debug)]
struct RawBinding {
    dtype: ElementType,
    shape: Vec<i64>,
    data: *const u8,
    byte_len: usize,
}

// The pointer is only dereferenced inside `run`, under the lifetime
// contract taken at `add_input`; the binding itself carries no thread
// affinity.
unsafe impl Send for RawBinding {}

/// A loaded model session with its bound inputs, output tree, and
/// flattened buffers.
///
/// A predictor is exclusively owned by its caller: at most one call may be
/// in flight at a time. The capi layer enforces this with a per-handle
/// lock; Rust callers get the same guarantee from `&mut self`.
#[derive(Debug)]
pub struct Predictor {
    model: Model,
    profiler: Profiler,
    bindings: Vec<RawBinding>,
    outputs: Vec<Value>,
    converted: OutputBuffers,
}

impl Predictor {
    /// Load a model and create a session for it.
    ///
    /// Establishes the process-wide environment on first use.
    pub fn new<P: AsRef<Path>>(path: P, options: SessionOptions) -> Result<Self> {
        Environment::global();
        let model = Model::load(path, options.device).map_err(load_error)?;
        let profiler = Profiler::new(options.profile_config());
        info!(
            model = %model.name(),
            device = %model.device(),
            "created predictor"
        );
        Ok(Self {
            model,
            profiler,
            bindings: Vec::new(),
            outputs: Vec::new(),
            converted: OutputBuffers::default(),
        })
    }

    /// Number of input slots the model declares.
    pub fn input_count(&self) -> usize {
        self.model.input_count()
    }

    /// Ordered input slot names.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.model.input_names()
    }

    /// Number of inputs currently bound.
    pub fn bound_input_count(&self) -> usize {
        self.bindings.len()
    }

    /// Bind the next positional input as a zero-copy view over caller
    /// bytes.
    ///
    /// `product(dims) * width(dtype)` bytes will be read from `data`, and
    /// only at execution time — nothing is copied here.
    ///
    /// # Safety
    ///
    /// `data` must point to at least `product(dims) * width(dtype)`
    /// readable bytes, and must remain valid until the [`Predictor::run`]
    /// call that consumes this binding returns. The native layer takes no
    /// ownership of the caller's buffer.
    pub unsafe fn add_input(&mut self, data: *const u8, dims: &[i64], dtype_tag: i32) -> Result<()> {
        let dtype = ElementType::from_wire(dtype_tag).map_err(unsupported)?;
        let width = dtype
            .byte_width()
            .ok_or_else(|| Error::UnsupportedType(dtype.to_string()))?;
        if dims.is_empty() {
            return Err(Error::InvalidArgument("input shape must have rank >= 1".into()));
        }
        let count = num_elements(dims).map_err(|e| Error::InvalidArgument(e.to_string()))?;
        if data.is_null() {
            return Err(Error::InvalidArgument("input buffer pointer is null".into()));
        }

        let byte_len = count * width;
        debug!(
            slot = self.bindings.len(),
            dtype = %dtype,
            shape = ?dims,
            byte_len,
            "bound input"
        );
        self.bindings.push(RawBinding {
            dtype,
            shape: dims.to_vec(),
            data,
            byte_len,
        });
        Ok(())
    }

    /// Execute the model over the current bindings.
    ///
    /// Fails if the bound-input count differs from the model's declared
    /// input count, leaving previous outputs untouched. On success the
    /// previous output tree is replaced and any flattened list is
    /// invalidated. Bindings stay in place until [`Predictor::clear`];
    /// re-running requires the bound buffers to still be valid.
    pub fn run(&mut self) -> Result<()> {
        if self.bindings.len() != self.model.input_count() {
            return Err(Error::Execution(format!(
                "model declares {} inputs but {} are bound",
                self.model.input_count(),
                self.bindings.len()
            )));
        }

        let views = self
            .bindings
            .iter()
            .map(|binding| {
                // SAFETY: upheld by the `add_input` contract — the pointer
                // covers `byte_len` bytes and outlives this call.
                let bytes = unsafe { slice::from_raw_parts(binding.data, binding.byte_len) };
                TensorView::new(binding.dtype, &binding.shape, bytes)
                    .map_err(|e| Error::Execution(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let outputs = self.model.run(&views, &self.profiler).map_err(run_error)?;
        debug!(outputs = outputs.len(), "execution finished");
        self.outputs = outputs;
        self.converted.clear();
        Ok(())
    }

    /// Flatten the current output tree into the ordered buffer list.
    ///
    /// On failure the staged buffers are released and the previously
    /// committed list is left as it was.
    pub fn convert_output(&mut self) -> Result<()> {
        let staged = flatten_outputs(&self.outputs)?;
        debug!(leaves = staged.len(), "flattened output tree");
        self.converted.commit(staged);
        Ok(())
    }

    /// Number of leaves in the current flattened list.
    pub fn num_outputs(&self) -> usize {
        self.converted.len()
    }

    /// Borrow one flattened output. Ownership stays with the predictor.
    pub fn output(&self, index: usize) -> Result<&TypedBuffer> {
        self.converted.get(index)
    }

    /// Release all flattened buffers and drop all input bindings. Safe to
    /// call when there is nothing to release.
    pub fn clear(&mut self) {
        self.converted.clear();
        self.bindings.clear();
    }

    /// Flush the profiling artifact to disk and return its path.
    pub fn end_profiling(&self) -> Result<PathBuf> {
        self.profiler.flush().map_err(profile_error)
    }

    /// Read the profiling artifact back as a string.
    pub fn read_profile(&self) -> Result<String> {
        self.profiler.read().map_err(profile_error)
    }

    /// Wall-clock nanoseconds at which this session's profiler started.
    pub fn profiling_start_time_ns(&self) -> i64 {
        self.profiler.start_time_ns()
    }
}

fn load_error(err: EngineError) -> Error {
    match err {
        EngineError::DeviceUnavailable(device) => Error::UnsupportedDevice(device.to_string()),
        other => Error::Load(other.to_string()),
    }
}

fn run_error(err: EngineError) -> Error {
    Error::Execution(err.to_string())
}

fn profile_error(err: EngineError) -> Error {
    match err {
        EngineError::Io(io) => Error::Io(io),
        other => Error::Execution(other.to_string()),
    }
}

fn unsupported(err: CoreError) -> Error {
    Error::UnsupportedType(err.to_string())
}
