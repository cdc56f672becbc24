//! Reference-counted subscriber context and its C trampolines.
//!
//! The OS treats the context as an opaque pointer plus retain/release
//! function pointers and calls them as it copies or drops references. Here
//! the context is an Arc'd cell holding the boxed subscriber callback, and
//! the trampolines map the OS's manual reference counting onto the Arc's
//! strong count.

use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use log::{error, warn};
use parking_lot::Mutex;

use crate::event::{EventBatch, EventFlags, EventId};
use crate::system::{ContextDescriptor, StreamRef};

/// Subscriber callback, invoked once per delivery with the originating
/// stream and the batch of events
pub type EventHandler = Box<dyn FnMut(StreamRef, EventBatch<'_>) + Send + 'static>;

/// The cell the OS context pointer points at.
pub(crate) struct StreamContext {
    /// Subscriber callback. Locked per delivery; parking_lot locks do not
    /// poison, so a caught panic in one delivery does not wedge the next.
    handler: Mutex<EventHandler>,
}

impl StreamContext {
    /// Allocate a context with a strong count of one. Dropping the
    /// returned Arc releases that initial reference.
    pub(crate) fn new(handler: EventHandler) -> Arc<StreamContext> {
        Arc::new(StreamContext {
            handler: Mutex::new(handler),
        })
    }

    /// Descriptor handing this context to the OS: the Arc's address as the
    /// info pointer plus the two refcount trampolines.
    pub(crate) fn descriptor(context: &Arc<StreamContext>) -> ContextDescriptor {
        ContextDescriptor {
            info: Arc::as_ptr(context) as *mut c_void,
            retain: retain_context,
            release: release_context,
        }
    }
}

/// Retain trampoline, called by the OS when it copies the context.
///
/// Bumps the Arc strong count and returns the same pointer.
pub(crate) unsafe extern "C" fn retain_context(info: *const c_void) -> *const c_void {
    if info.is_null() {
        // Broken OS contract; nothing to retain.
        return info;
    }
    Arc::increment_strong_count(info as *const StreamContext);
    info
}

/// Release trampoline, the matching decrement for retain_context.
///
/// The last release frees the cell and the subscriber callback in it.
pub(crate) unsafe extern "C" fn release_context(info: *const c_void) {
    if info.is_null() {
        // Broken OS contract; nothing to release.
        return;
    }
    drop(Arc::from_raw(info as *const StreamContext));
}

/// Event delivery trampoline, the C callback of every stream the bridge
/// creates.
///
/// Decodes the parallel arrays into an EventBatch and hands it to the
/// subscriber. A panicking subscriber is contained here; unwinding must
/// not cross back into C.
pub(crate) unsafe extern "C" fn deliver_events(
    stream: *const c_void,
    info: *mut c_void,
    num_events: usize,
    event_paths: *mut c_void,
    event_flags: *const EventFlags,
    event_ids: *const EventId,
) {
    if info.is_null() {
        warn!(
            "event delivery carried a null context; dropping {} event(s)",
            num_events
        );
        return;
    }
    let context = &*(info as *const StreamContext);
    let stream = StreamRef::from_raw(stream as *mut c_void);
    let result = catch_unwind(AssertUnwindSafe(|| {
        let batch = EventBatch::from_raw(num_events, event_paths, event_flags, event_ids);
        let mut handler = context.handler.lock();
        (*handler)(stream, batch);
    }));
    if let Err(panic) = result {
        error!("event handler panicked: {:?}", panic);
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
