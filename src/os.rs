//! FSEvents-backed StreamSystem.
//!
//! Thin marshalling layer: watch paths become a CFArray of CFStrings, run
//! loop handles become CFRunLoopRefs, and every trait call maps onto one
//! FSEventStream function.

use std::ffi::c_void;
use std::ptr;

use core_foundation::array::CFArray;
use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_foundation::string::CFString;
use log::debug;

use crate::ffi;
use crate::stream::EventStream;
use crate::system::{CreateRequest, RunLoopHandle, RunLoopMode, StreamRef, StreamSystem};

/// The real OS subsystem.
///
/// Watch paths are handed to CoreFoundation as UTF-8 strings, so a watch
/// path that is not valid UTF-8 fails creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsStreamSystem;

/// Stream type backed by the real subsystem
pub type FsEventStream = EventStream<OsStreamSystem>;

impl RunLoopHandle {
    /// Handle to the calling thread's run loop.
    pub fn current() -> RunLoopHandle {
        let run_loop = CFRunLoop::get_current();
        RunLoopHandle::from_raw(run_loop.as_concrete_TypeRef() as *mut c_void)
    }
}

impl EventStream<OsStreamSystem> {
    /// Dump the stream's state to stderr through FSEventStreamShow.
    /// Debugging aid only.
    pub fn show(&self) {
        unsafe { ffi::FSEventStreamShow(self.raw().as_ptr() as *const c_void) };
    }
}

fn run_loop_mode_name(mode: RunLoopMode) -> ffi::CFStringRef {
    match mode {
        RunLoopMode::Default => unsafe { kCFRunLoopDefaultMode as ffi::CFStringRef },
        RunLoopMode::Common => unsafe { kCFRunLoopCommonModes as ffi::CFStringRef },
    }
}

impl StreamSystem for OsStreamSystem {
    fn create_stream(&self, request: &CreateRequest<'_>) -> Option<StreamRef> {
        let mut path_strings = Vec::with_capacity(request.paths.len());
        for path in request.paths {
            match path.to_str() {
                Some(path) => path_strings.push(CFString::new(path)),
                None => {
                    // CFString wants UTF-8; a watch path that is not valid
                    // UTF-8 cannot be expressed to the OS.
                    debug!("watch path is not valid UTF-8: {}", path.display());
                    return None;
                }
            }
        }
        let paths = CFArray::from_CFTypes(&path_strings);

        let context = ffi::FSEventStreamContext {
            version: 0,
            info: request.context.info,
            retain: Some(request.context.retain),
            release: Some(request.context.release),
            copy_description: None,
        };

        let stream = unsafe {
            ffi::FSEventStreamCreate(
                ptr::null(),
                request.callback,
                &context,
                paths.as_concrete_TypeRef() as ffi::CFArrayRef,
                request.since_when,
                request.latency.as_secs_f64(),
                request.flags,
            )
        };
        if stream.is_null() {
            None
        } else {
            Some(StreamRef::from_raw(stream))
        }
    }

    fn schedule(&self, stream: StreamRef, run_loop: RunLoopHandle, mode: RunLoopMode) {
        unsafe {
            ffi::FSEventStreamScheduleWithRunLoop(
                stream.as_ptr(),
                run_loop.as_ptr(),
                run_loop_mode_name(mode),
            );
        }
    }

    fn start(&self, stream: StreamRef) -> bool {
        unsafe { ffi::FSEventStreamStart(stream.as_ptr()) }
    }

    fn stop(&self, stream: StreamRef) {
        unsafe { ffi::FSEventStreamStop(stream.as_ptr()) };
    }

    fn invalidate(&self, stream: StreamRef) {
        unsafe { ffi::FSEventStreamInvalidate(stream.as_ptr()) };
    }

    fn retain(&self, stream: StreamRef) {
        unsafe { ffi::FSEventStreamRetain(stream.as_ptr()) };
    }

    fn release(&self, stream: StreamRef) {
        unsafe { ffi::FSEventStreamRelease(stream.as_ptr()) };
    }
}

#[cfg(test)]
#[path = "os_test.rs"]
mod tests;
