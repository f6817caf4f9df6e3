//! C ABI for the tensorlink boundary.
//!
//! One `extern "C"` function per boundary operation, consumable from any
//! host language that can call C. Contexts are opaque 64-bit handles;
//! failures are reported through the thread-local last-error slot
//! (`tensorlink_has_error` / `tensorlink_get_error` /
//! `tensorlink_reset_error`) and a per-call sentinel (null handle, zeroed
//! struct, `0`, or `-1`). No panic or unwind ever crosses the boundary.
//!
//! The expected call sequence is:
//!
//! ```text
//! h = tensorlink_new_predictor(path, device)
//! tensorlink_add_input(h, buf, dims, rank, dtype)   // once per input slot
//! tensorlink_run(h)
//! tensorlink_convert_output(h)
//! n = tensorlink_num_outputs(h)
//! out = tensorlink_get_output(h, i)                 // for i in 0..n
//! tensorlink_clear(h)                               // or go straight to delete
//! tensorlink_delete_predictor(h)
//! ```
//!
//! Every call that can fail should be followed by a
//! `tensorlink_has_error` check; read and reset the message before the
//! next call, because a later failure overwrites it.

#![warn(clippy::all)]

mod handle;
mod last_error;

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice;
use tensorlink_api::{DeviceKind, Error, Predictor, Result, SessionOptions};

/// Wire tag for the CPU device.
pub const TENSORLINK_DEVICE_CPU: c_int = 0;
/// Wire tag for the CUDA device.
pub const TENSORLINK_DEVICE_CUDA: c_int = 1;

/// One flattened output as seen from C: the element-type wire tag, a
/// borrowed pointer to the tensor bytes, and a borrowed pointer to the
/// shape.
///
/// Both pointers stay owned by the context; they are valid until the next
/// `tensorlink_convert_output`, `tensorlink_clear`, or
/// `tensorlink_delete_predictor` on that context. A zeroed struct (dtype
/// tag `0`, null pointers) is the failure sentinel.
#[repr(C)]
pub struct TensorlinkOutput {
    /// Element-type wire tag, `0` on failure.
    pub dtype: i32,
    /// Tensor bytes, null on failure.
    pub data: *const c_void,
    /// Shape dimensions, null on failure.
    pub shape: *const i64,
    /// Number of shape dimensions.
    pub shape_len: usize,
}

impl TensorlinkOutput {
    fn empty() -> Self {
        Self {
            dtype: 0,
            data: std::ptr::null(),
            shape: std::ptr::null(),
            shape_len: 0,
        }
    }
}

/// Run one boundary operation: clear the error slot, run, capture any
/// failure (or panic) into the slot.
fn boundary<T>(op: impl FnOnce() -> Result<T>) -> Option<T> {
    last_error::clear_last_error();
    match catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            last_error::set_last_error(err.to_string());
            None
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic crossing the boundary".to_string());
            last_error::set_last_error(message);
            None
        }
    }
}

/// Load a model and create a predictor context for it.
///
/// `device` is `TENSORLINK_DEVICE_CPU` or `TENSORLINK_DEVICE_CUDA`.
/// Returns an opaque handle, or `0` on failure.
///
/// # Safety
///
/// `model_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn tensorlink_new_predictor(
    model_path: *const c_char,
    device: c_int,
) -> u64 {
    boundary(|| {
        if model_path.is_null() {
            return Err(Error::InvalidArgument("model path pointer is null".into()));
        }
        let path = unsafe { CStr::from_ptr(model_path) }
            .to_str()
            .map_err(|_| Error::Load("model path is not valid UTF-8".into()))?
            .to_owned();
        let device = DeviceKind::from_wire(device)
            .ok_or_else(|| Error::UnsupportedDevice(format!("unknown device tag {device}")))?;
        let predictor = Predictor::new(&path, SessionOptions::default().with_device(device))?;
        Ok(handle::insert(predictor))
    })
    .unwrap_or(handle::NULL_HANDLE)
}

/// Bind the next positional input as a zero-copy view over `buffer`.
///
/// `product(dims) * width(dtype)` bytes will be read from `buffer`, and
/// only during `tensorlink_run`.
///
/// # Safety
///
/// `dims` must point to `rank` readable `int64` values. `buffer` must
/// point to at least `product(dims) * width(dtype)` readable bytes and
/// must remain valid until the `tensorlink_run` call that consumes the
/// binding returns; the context takes no ownership of it.
#[no_mangle]
pub unsafe extern "C" fn tensorlink_add_input(
    ctx: u64,
    buffer: *const c_void,
    dims: *const i64,
    rank: c_int,
    dtype: c_int,
) {
    boundary(|| {
        if dims.is_null() || rank < 1 {
            return Err(Error::InvalidArgument(
                "input shape must have rank >= 1".into(),
            ));
        }
        let dims = unsafe { slice::from_raw_parts(dims, rank as usize) };
        handle::with_predictor(ctx, |pred| {
            // SAFETY: forwarded caller contract, see above.
            unsafe { pred.add_input(buffer as *const u8, dims, dtype) }
        })
    });
}

/// Execute the model over the bound inputs. Blocks until done.
#[no_mangle]
pub extern "C" fn tensorlink_run(ctx: u64) {
    boundary(|| handle::with_predictor(ctx, |pred| pred.run()));
}

/// Flatten the output tree into the indexed buffer list.
#[no_mangle]
pub extern "C" fn tensorlink_convert_output(ctx: u64) {
    boundary(|| handle::with_predictor(ctx, |pred| pred.convert_output()));
}

/// Number of flattened outputs, `0` on failure.
#[no_mangle]
pub extern "C" fn tensorlink_num_outputs(ctx: u64) -> c_int {
    boundary(|| handle::with_predictor(ctx, |pred| Ok(pred.num_outputs() as c_int))).unwrap_or(0)
}

/// Read one flattened output by index. Ownership of the returned buffers
/// stays with the context; see [`TensorlinkOutput`].
#[no_mangle]
pub extern "C" fn tensorlink_get_output(ctx: u64, index: c_int) -> TensorlinkOutput {
    boundary(|| {
        handle::with_predictor(ctx, |pred| {
            let index = usize::try_from(index)
                .map_err(|_| Error::InvalidArgument(format!("negative output index {index}")))?;
            let buffer = pred.output(index)?;
            Ok(TensorlinkOutput {
                dtype: buffer.dtype().to_wire(),
                data: buffer.data().as_ptr() as *const c_void,
                shape: buffer.shape().as_ptr(),
                shape_len: buffer.shape().len(),
            })
        })
    })
    .unwrap_or_else(TensorlinkOutput::empty)
}

/// Release all flattened buffers and input bindings of a context. Safe to
/// call when there is nothing to release.
#[no_mangle]
pub extern "C" fn tensorlink_clear(ctx: u64) {
    boundary(|| {
        handle::with_predictor(ctx, |pred| {
            pred.clear();
            Ok(())
        })
    });
}

/// Destroy a context and everything it owns. The handle is dead
/// afterwards; using it again is a reported error, as is destroying it
/// twice.
#[no_mangle]
pub extern "C" fn tensorlink_delete_predictor(ctx: u64) {
    boundary(|| handle::remove(ctx).map(drop));
}

/// Whether a failure message is pending on this thread.
#[no_mangle]
pub extern "C" fn tensorlink_has_error() -> c_int {
    c_int::from(last_error::has_last_error())
}

/// Borrowed pointer to the pending failure message, null when there is
/// none. Valid until the next boundary call on this thread.
#[no_mangle]
pub extern "C" fn tensorlink_get_error() -> *const c_char {
    last_error::last_error_ptr()
}

/// Empty the error slot for this thread.
#[no_mangle]
pub extern "C" fn tensorlink_reset_error() {
    last_error::clear_last_error();
}

/// Flush the profiling artifact for a context to disk.
#[no_mangle]
pub extern "C" fn tensorlink_end_profiling(ctx: u64) {
    boundary(|| handle::with_predictor(ctx, |pred| pred.end_profiling().map(drop)));
}

/// Read the profiling artifact as a malloc'd C string, null on failure.
/// Release it with [`tensorlink_string_free`].
#[no_mangle]
pub extern "C" fn tensorlink_read_profile(ctx: u64) -> *mut c_char {
    boundary(|| {
        handle::with_predictor(ctx, |pred| {
            let text = pred.read_profile()?;
            CString::new(text)
                .map_err(|_| Error::Execution("profile contained a null byte".into()))
        })
    })
    .map(CString::into_raw)
    .unwrap_or(std::ptr::null_mut())
}

/// Session profiling start time as wall-clock nanoseconds, `-1` on
/// failure.
#[no_mangle]
pub extern "C" fn tensorlink_profiling_start_time(ctx: u64) -> i64 {
    boundary(|| handle::with_predictor(ctx, |pred| Ok(pred.profiling_start_time_ns())))
        .unwrap_or(-1)
}

/// Release a string returned by [`tensorlink_read_profile`].
///
/// # Safety
///
/// `ptr` must be null or a pointer previously returned by
/// `tensorlink_read_profile` that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn tensorlink_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}
