//! Checked context handles.
//!
//! Contexts cross the boundary as 64-bit handles encoding a slot index in
//! the low half and a generation counter in the high half. The generation
//! is bumped when a slot is vacated, so a handle kept past
//! `delete_predictor` resolves to a reported error instead of a dangling
//! pointer — even after the slot has been reused. Handle value 0 is never
//! issued.

use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, TryLockError};
use tensorlink_api::{Error, Predictor, Result};
use tracing::debug;

pub(crate) type RawHandle = u64;

/// The failure sentinel for handle-returning calls.
pub(crate) const NULL_HANDLE: RawHandle = 0;

struct Slot {
    generation: u32,
    entry: Option<Arc<Mutex<Predictor>>>,
}

#[derive(Default)]
struct HandleTable {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

static TABLE: Lazy<Mutex<HandleTable>> = Lazy::new(|| Mutex::new(HandleTable::default()));

fn encode(index: usize, generation: u32) -> RawHandle {
    ((generation as u64) << 32) | (index as u64 + 1)
}

fn decode(handle: RawHandle) -> Option<(usize, u32)> {
    let index = (handle & 0xffff_ffff) as usize;
    let generation = (handle >> 32) as u32;
    index.checked_sub(1).map(|index| (index, generation))
}

/// Register a predictor and issue its handle.
pub(crate) fn insert(predictor: Predictor) -> RawHandle {
    let mut table = TABLE.lock().unwrap();
    let entry = Some(Arc::new(Mutex::new(predictor)));
    let handle = match table.free.pop() {
        Some(index) => {
            let slot = &mut table.slots[index];
            slot.entry = entry;
            encode(index, slot.generation)
        }
        None => {
            table.slots.push(Slot {
                generation: 1,
                entry,
            });
            encode(table.slots.len() - 1, 1)
        }
    };
    debug!(handle, "registered predictor");
    handle
}

/// Resolve a live handle to its predictor.
fn resolve(handle: RawHandle) -> Result<Arc<Mutex<Predictor>>> {
    let (index, generation) = decode(handle)
        .ok_or_else(|| Error::InvalidContext("null context handle".into()))?;
    let table = TABLE.lock().unwrap();
    let slot = table
        .slots
        .get(index)
        .filter(|slot| slot.generation == generation)
        .ok_or_else(|| Error::InvalidContext(format!("unknown context handle {handle:#x}")))?;
    slot.entry.clone().ok_or_else(|| {
        Error::InvalidContext(format!("context handle {handle:#x} was already destroyed"))
    })
}

/// Unregister a handle, returning the predictor for teardown. The slot's
/// generation is bumped so the handle can never resolve again.
pub(crate) fn remove(handle: RawHandle) -> Result<Arc<Mutex<Predictor>>> {
    let (index, generation) = decode(handle)
        .ok_or_else(|| Error::InvalidContext("null context handle".into()))?;
    let mut table = TABLE.lock().unwrap();
    let slot = table
        .slots
        .get_mut(index)
        .filter(|slot| slot.generation == generation)
        .ok_or_else(|| Error::InvalidContext(format!("unknown context handle {handle:#x}")))?;
    let entry = slot.entry.take().ok_or_else(|| {
        Error::InvalidContext(format!("context handle {handle:#x} was already destroyed"))
    })?;
    slot.generation = slot.generation.wrapping_add(1);
    table.free.push(index);
    debug!(handle, "destroyed predictor");
    Ok(entry)
}

/// Run an operation against the predictor behind a handle.
///
/// At most one call may be in flight per context; a context already in
/// use on another thread is reported, not waited on.
pub(crate) fn with_predictor<T>(
    handle: RawHandle,
    op: impl FnOnce(&mut Predictor) -> Result<T>,
) -> Result<T> {
    let entry = resolve(handle)?;
    let mut guard = entry.try_lock().map_err(|err| match err {
        TryLockError::WouldBlock => {
            Error::InvalidContext("context is in use on another thread".into())
        }
        TryLockError::Poisoned(_) => {
            Error::InvalidContext("context was poisoned by an earlier panic".into())
        }
    })?;
    op(&mut guard)
}
