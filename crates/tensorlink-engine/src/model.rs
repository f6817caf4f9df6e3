//! Loaded models and the narrow execution interface.

use crate::device::DeviceKind;
use crate::error::{EngineError, Result};
use crate::executor;
use crate::manifest::Manifest;
use crate::profiling::Profiler;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tensorlink_core::{ElementType, TensorView, Value};
use tracing::info;

/// A validated model bound to a device.
///
/// Loading discovers the ordered input and output slot declarations; the
/// orders are stable for the life of the model and define the positional
/// binding contract of the boundary.
#[derive(Debug)]
pub struct Model {
    manifest: Manifest,
    path: PathBuf,
    device: DeviceKind,
    input_dtypes: Vec<ElementType>,
}

impl Model {
    /// Load a model manifest from disk for the given device.
    pub fn load<P: AsRef<Path>>(path: P, device: DeviceKind) -> Result<Self> {
        if !device.is_available() {
            return Err(EngineError::DeviceUnavailable(device));
        }
        let path = path.as_ref().to_path_buf();
        let manifest = Manifest::from_path(&path)?;
        // dtype names were validated with the manifest.
        let input_dtypes = manifest
            .inputs
            .iter()
            .map(|slot| ElementType::from_str(&slot.dtype).map_err(EngineError::from))
            .collect::<Result<Vec<_>>>()?;
        info!(
            model = %manifest.name,
            path = %path.display(),
            device = %device,
            inputs = manifest.inputs.len(),
            outputs = manifest.outputs.len(),
            "loaded model"
        );
        Ok(Self {
            manifest,
            path,
            device,
            input_dtypes,
        })
    }

    /// Model name from the manifest.
    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    /// Path the model was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Device the model was bound to.
    pub fn device(&self) -> DeviceKind {
        self.device
    }

    /// Number of declared input slots.
    pub fn input_count(&self) -> usize {
        self.manifest.inputs.len()
    }

    /// Ordered input slot names.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.manifest.inputs.iter().map(|slot| slot.name.as_str())
    }

    /// Ordered input element types.
    pub fn input_dtypes(&self) -> &[ElementType] {
        &self.input_dtypes
    }

    /// Number of declared top-level outputs.
    pub fn output_count(&self) -> usize {
        self.manifest.outputs.len()
    }

    /// Ordered output value names.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.manifest.outputs.iter().map(String::as_str)
    }

    /// Execute the graph over positionally bound inputs.
    ///
    /// Blocks until execution completes; outputs are returned in declared
    /// order and may be composite values.
    pub fn run(&self, inputs: &[TensorView<'_>], profiler: &Profiler) -> Result<Vec<Value>> {
        executor::execute(self, inputs, profiler)
    }

    pub(crate) fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}
