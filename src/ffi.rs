//! Raw FSEvents declarations.
//!
//! Hand-written mirror of the FSEventStream C interface, limited to the
//! calls the bridge makes. Types follow the platform headers.

use std::ffi::c_void;

use crate::event::EventId;
use crate::flags::CreateFlags;
use crate::system::{ContextRelease, ContextRetain, EventStreamCallback};

pub type CFAllocatorRef = *const c_void;
pub type CFArrayRef = *const c_void;
pub type CFStringRef = *const c_void;
pub type CFRunLoopRef = *mut c_void;
pub type CFIndex = isize;
pub type CFTimeInterval = f64;
pub type FSEventStreamRef = *mut c_void;
pub type ConstFSEventStreamRef = *const c_void;

/// FSEventStreamContext from FSEvents.h. The OS copies it at creation and
/// calls retain/release as it references `info`.
#[repr(C)]
pub struct FSEventStreamContext {
    pub version: CFIndex,
    pub info: *mut c_void,
    pub retain: Option<ContextRetain>,
    pub release: Option<ContextRelease>,
    pub copy_description: Option<unsafe extern "C" fn(info: *const c_void) -> CFStringRef>,
}

#[link(name = "CoreServices", kind = "framework")]
extern "C" {
    pub fn FSEventStreamCreate(
        allocator: CFAllocatorRef,
        callback: EventStreamCallback,
        context: *const FSEventStreamContext,
        paths_to_watch: CFArrayRef,
        since_when: EventId,
        latency: CFTimeInterval,
        flags: CreateFlags,
    ) -> FSEventStreamRef;

    pub fn FSEventStreamScheduleWithRunLoop(
        stream: FSEventStreamRef,
        run_loop: CFRunLoopRef,
        run_loop_mode: CFStringRef,
    );

    pub fn FSEventStreamStart(stream: FSEventStreamRef) -> bool;

    pub fn FSEventStreamStop(stream: FSEventStreamRef);

    pub fn FSEventStreamInvalidate(stream: FSEventStreamRef);

    pub fn FSEventStreamRetain(stream: FSEventStreamRef);

    pub fn FSEventStreamRelease(stream: FSEventStreamRef);

    pub fn FSEventStreamShow(stream: ConstFSEventStreamRef);
}
