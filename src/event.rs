//! Event batch decoding.
//!
//! Contains the Event record and the zero-copy EventBatch iterator over the
//! parallel C arrays handed to the stream callback.

use std::ffi::{c_char, c_void, CStr, OsStr};
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

/// Event identifier assigned by the OS; usable as a resume point
pub type EventId = u64;

/// Per-event flag bits as delivered by the OS
pub type EventFlags = u32;

/// One filesystem change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Path the change was observed on
    pub path: PathBuf,
    /// Flag bits describing the change
    pub flags: EventFlags,
    /// Identifier of this event
    pub id: EventId,
}

/// Single-pass view over one callback delivery.
///
/// Borrows the three parallel arrays (paths, flags, ids) owned by the OS
/// for the duration of the callback; path bytes are only copied when an
/// [`Event`] is yielded.
pub struct EventBatch<'a> {
    paths: *const *const c_char,
    flags: *const EventFlags,
    ids: *const EventId,
    count: usize,
    index: usize,
    /// Ties the borrow to the delivery that produced the arrays
    _delivery: PhantomData<&'a ()>,
}

impl<'a> EventBatch<'a> {
    /// Build a batch over the raw callback arguments.
    ///
    /// # Safety
    ///
    /// `event_paths` must point to `num_events` NUL-terminated C strings,
    /// and `event_flags`/`event_ids` to `num_events` elements each, all
    /// valid for `'a` (in practice: the duration of the callback).
    pub(crate) unsafe fn from_raw(
        num_events: usize,
        event_paths: *mut c_void,
        event_flags: *const EventFlags,
        event_ids: *const EventId,
    ) -> EventBatch<'a> {
        EventBatch {
            paths: event_paths as *const *const c_char,
            flags: event_flags,
            ids: event_ids,
            count: num_events,
            index: 0,
            _delivery: PhantomData,
        }
    }

    /// Number of events left in the delivery's claimed count
    pub fn len(&self) -> usize {
        self.count - self.index
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> Iterator for EventBatch<'a> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if self.index >= self.count {
            return None;
        }
        let i = self.index;
        let path = unsafe { *self.paths.add(i) };
        if path.is_null() {
            // The OS handed fewer strings than num_events claims; end the
            // batch instead of walking off it.
            self.index = self.count;
            return None;
        }
        let bytes = unsafe { CStr::from_ptr(path) }.to_bytes();
        let (flags, id) = unsafe { (*self.flags.add(i), *self.ids.add(i)) };
        self.index += 1;
        Some(Event {
            path: PathBuf::from(OsStr::from_bytes(bytes)),
            flags,
            id,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // A null path entry ends the batch early, so only the upper bound
        // is a promise.
        (0, Some(self.len()))
    }
}

impl<'a> FusedIterator for EventBatch<'a> {}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
