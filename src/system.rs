//! The seam between the bridge and the OS stream subsystem.
//!
//! StreamSystem abstracts the handful of FSEvents calls the bridge makes,
//! so the lifecycle and reference-counting logic can be exercised against
//! an in-memory fake. The real implementation lives in os.rs.

use std::ffi::c_void;
use std::path::PathBuf;
use std::time::Duration;

use crate::event::{EventFlags, EventId};
use crate::flags::CreateFlags;

/// Opaque identity of one OS stream.
///
/// Doubles as the first argument of every delivery, so a handler shared
/// across streams can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamRef(*mut c_void);

impl StreamRef {
    pub(crate) fn from_raw(ptr: *mut c_void) -> StreamRef {
        StreamRef(ptr)
    }

    /// The underlying FSEventStreamRef (or a fake subsystem's cookie)
    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

// Ensure StreamRef is Send + Sync so a Send handler can keep it.
// The pointer is only handed back to the OS and compared, never
// dereferenced by the bridge.
unsafe impl Send for StreamRef {}
unsafe impl Sync for StreamRef {}

/// Opaque handle to the run loop a stream gets scheduled on
#[derive(Debug, Clone, Copy)]
pub struct RunLoopHandle(*mut c_void);

impl RunLoopHandle {
    /// Wrap a raw CFRunLoopRef
    pub fn from_raw(ptr: *mut c_void) -> RunLoopHandle {
        RunLoopHandle(ptr)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

/// Run loop mode the stream's deliveries fire in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLoopMode {
    /// kCFRunLoopDefaultMode
    Default,
    /// kCFRunLoopCommonModes
    Common,
}

/// C signature of the stream event callback
pub type EventStreamCallback = unsafe extern "C" fn(
    stream: *const c_void,
    info: *mut c_void,
    num_events: usize,
    event_paths: *mut c_void,
    event_flags: *const EventFlags,
    event_ids: *const EventId,
);

/// C signature of the context retain callback
pub type ContextRetain = unsafe extern "C" fn(info: *const c_void) -> *const c_void;

/// C signature of the context release callback
pub type ContextRelease = unsafe extern "C" fn(info: *const c_void);

/// Context descriptor the subsystem copies at stream creation
#[derive(Clone, Copy)]
pub struct ContextDescriptor {
    /// Opaque pointer handed back to every callback
    pub info: *mut c_void,
    /// Called when the subsystem takes a reference on `info`
    pub retain: ContextRetain,
    /// Called when the subsystem drops a reference on `info`
    pub release: ContextRelease,
}

/// Everything needed to create one stream
pub struct CreateRequest<'a> {
    pub callback: EventStreamCallback,
    pub context: ContextDescriptor,
    /// Directories to watch
    pub paths: &'a [PathBuf],
    /// Event id to resume from, or EVENT_ID_SINCE_NOW
    pub since_when: EventId,
    /// Coalescing window the OS may batch events within
    pub latency: Duration,
    pub flags: CreateFlags,
}

/// The OS stream subsystem as the bridge sees it.
/// Allows mocking in tests while using the real FSEvents API in production.
pub trait StreamSystem {
    /// Create a stream, or None when the subsystem refuses.
    ///
    /// On success the subsystem has taken its own reference on the
    /// request's context (through `context.retain`). On refusal it leaves
    /// the context untouched.
    fn create_stream(&self, request: &CreateRequest<'_>) -> Option<StreamRef>;

    /// Attach the stream to a run loop. Required before start.
    fn schedule(&self, stream: StreamRef, run_loop: RunLoopHandle, mode: RunLoopMode);

    /// Begin event delivery. Returns false if the OS refuses.
    fn start(&self, stream: StreamRef) -> bool;

    /// Pause event delivery, keeping the stream and its resume position.
    fn stop(&self, stream: StreamRef);

    /// Detach the stream from its run loops. Required before the last
    /// release.
    fn invalidate(&self, stream: StreamRef);

    /// Take an extra reference on the stream handle.
    fn retain(&self, stream: StreamRef);

    /// Drop one reference on the stream handle. The last one destroys it
    /// and releases the subsystem's context reference.
    fn release(&self, stream: StreamRef);
}

#[cfg(test)]
#[path = "system_test.rs"]
mod tests;
