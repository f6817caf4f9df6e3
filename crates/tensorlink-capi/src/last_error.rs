//! The last-error slot behind `has_error`/`get_error`/`reset_error`.
//!
//! Storage is thread-local: callers on different threads observe
//! independent error states, so concurrent callers cannot clobber each
//! other's messages. Within a thread the slot is last-write-wins — a
//! second failure before the first is read overwrites it, and callers
//! wanting per-call detail must read the slot immediately after each
//! call.

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store a failure message, replacing any previous one.
pub(crate) fn set_last_error(message: impl Into<String>) {
    let owned = message.into();
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = Some(CString::new(owned).unwrap_or_else(|_| {
            CString::new("error message contained a null byte").expect("static message")
        }));
    });
}

/// Empty the slot.
pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = None;
    });
}

/// Whether a failure message is pending on this thread.
pub(crate) fn has_last_error() -> bool {
    LAST_ERROR.with(|slot| slot.borrow().is_some())
}

/// Borrowed pointer to the pending message, null when the slot is empty.
///
/// The pointer stays valid until the slot is next written or cleared on
/// this thread.
pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|msg| msg.as_ptr())
            .unwrap_or(std::ptr::null())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_last_write_wins() {
        clear_last_error();
        assert!(!has_last_error());
        set_last_error("first");
        set_last_error("second");
        let message = unsafe { std::ffi::CStr::from_ptr(last_error_ptr()) };
        assert_eq!(message.to_str().unwrap(), "second");
        clear_last_error();
        assert!(last_error_ptr().is_null());
    }

    #[test]
    fn interior_null_bytes_are_replaced() {
        set_last_error("bad\0message");
        assert!(has_last_error());
        clear_last_error();
    }
}
