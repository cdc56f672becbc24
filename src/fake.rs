//! In-memory stand-in for the OS stream subsystem.
//!
//! Records every call the bridge makes and drives the real C trampolines
//! (context retain/release and event delivery) the way the OS would, so
//! lifecycle and reference-counting behavior can be asserted without
//! FSEvents.

#![cfg_attr(coverage_nightly, coverage(off))]

use std::ffi::{c_char, c_void, CString};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::event::{EventFlags, EventId};
use crate::flags::CreateFlags;
use crate::system::{
    ContextDescriptor, CreateRequest, EventStreamCallback, RunLoopHandle, RunLoopMode, StreamRef,
    StreamSystem,
};

/// One created stream as the fake subsystem sees it
struct FakeStream {
    callback: EventStreamCallback,
    context: ContextDescriptor,
    paths: Vec<PathBuf>,
    since_when: EventId,
    latency: Duration,
    flags: CreateFlags,
    scheduled: Option<RunLoopMode>,
    started: bool,
    invalidated: bool,
    /// Handle refcount; one on creation
    refcount: usize,
    /// Set when the refcount hits zero and the handle is gone
    destroyed: bool,
    context_retains: usize,
    context_releases: usize,
    start_calls: usize,
    stop_calls: usize,
    invalidate_calls: usize,
}

#[derive(Default)]
struct FakeState {
    reject_next_create: bool,
    streams: Vec<FakeStream>,
}

/// Fake StreamSystem shared between a test and the bridge under test.
/// Clones see the same recorded state.
#[derive(Clone)]
pub(crate) struct FakeStreamSystem {
    state: Arc<Mutex<FakeState>>,
}

/// Snapshot of one fake stream's recorded state
#[derive(Debug, Clone)]
pub(crate) struct StreamRecord {
    pub paths: Vec<PathBuf>,
    pub since_when: EventId,
    pub latency: Duration,
    pub flags: CreateFlags,
    pub scheduled: Option<RunLoopMode>,
    pub started: bool,
    pub invalidated: bool,
    pub refcount: usize,
    pub destroyed: bool,
    pub context_retains: usize,
    pub context_releases: usize,
    pub start_calls: usize,
    pub stop_calls: usize,
    pub invalidate_calls: usize,
}

impl FakeStreamSystem {
    pub(crate) fn new() -> FakeStreamSystem {
        FakeStreamSystem {
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    /// A subsystem that refuses the next creation without touching the
    /// caller's context. The refusal is one-shot; later creates succeed.
    pub(crate) fn rejecting() -> FakeStreamSystem {
        let fake = FakeStreamSystem::new();
        fake.state.lock().reject_next_create = true;
        fake
    }

    pub(crate) fn created_streams(&self) -> usize {
        self.state.lock().streams.len()
    }

    /// Snapshot the recorded state of `stream`.
    pub(crate) fn record(&self, stream: StreamRef) -> StreamRecord {
        let state = self.state.lock();
        let s = &state.streams[Self::slot(stream)];
        StreamRecord {
            paths: s.paths.clone(),
            since_when: s.since_when,
            latency: s.latency,
            flags: s.flags,
            scheduled: s.scheduled,
            started: s.started,
            invalidated: s.invalidated,
            refcount: s.refcount,
            destroyed: s.destroyed,
            context_retains: s.context_retains,
            context_releases: s.context_releases,
            start_calls: s.start_calls,
            stop_calls: s.stop_calls,
            invalidate_calls: s.invalidate_calls,
        }
    }

    /// Deliver `events` on `stream` the way the OS would: only a
    /// scheduled, started, valid stream receives anything. Returns whether
    /// the callback ran.
    pub(crate) fn deliver(
        &self,
        stream: StreamRef,
        events: &[(&str, EventFlags, EventId)],
    ) -> bool {
        let (callback, info) = {
            let state = self.state.lock();
            let s = &state.streams[Self::slot(stream)];
            if s.destroyed || s.invalidated || !s.started || s.scheduled.is_none() {
                return false;
            }
            (s.callback, s.context.info)
        };

        // The three parallel arrays of a real delivery.
        let strings: Vec<CString> = events
            .iter()
            .map(|(path, _, _)| CString::new(*path).expect("fake path contains NUL"))
            .collect();
        let paths: Vec<*const c_char> = strings.iter().map(|s| s.as_ptr()).collect();
        let flags: Vec<EventFlags> = events.iter().map(|&(_, flags, _)| flags).collect();
        let ids: Vec<EventId> = events.iter().map(|&(_, _, id)| id).collect();

        // Outside the lock, so a handler may call back into the fake.
        unsafe {
            (callback)(
                stream.as_ptr() as *const c_void,
                info,
                events.len(),
                paths.as_ptr() as *mut c_void,
                flags.as_ptr(),
                ids.as_ptr(),
            );
        }
        true
    }

    fn slot(stream: StreamRef) -> usize {
        // Stream refs are handed out as slot index plus one.
        stream.as_ptr() as usize - 1
    }
}

impl StreamSystem for FakeStreamSystem {
    fn create_stream(&self, request: &CreateRequest<'_>) -> Option<StreamRef> {
        let mut state = self.state.lock();
        if state.reject_next_create {
            // A refusing OS never touches the caller's context.
            state.reject_next_create = false;
            return None;
        }
        // The real subsystem copies the descriptor and takes its own
        // reference on the context.
        unsafe { (request.context.retain)(request.context.info as *const c_void) };
        state.streams.push(FakeStream {
            callback: request.callback,
            context: request.context,
            paths: request.paths.to_vec(),
            since_when: request.since_when,
            latency: request.latency,
            flags: request.flags,
            scheduled: None,
            started: false,
            invalidated: false,
            refcount: 1,
            destroyed: false,
            context_retains: 1,
            context_releases: 0,
            start_calls: 0,
            stop_calls: 0,
            invalidate_calls: 0,
        });
        Some(StreamRef::from_raw(state.streams.len() as *mut c_void))
    }

    fn schedule(&self, stream: StreamRef, _run_loop: RunLoopHandle, mode: RunLoopMode) {
        let mut state = self.state.lock();
        let s = &mut state.streams[Self::slot(stream)];
        assert!(!s.invalidated, "schedule on an invalidated fake stream");
        s.scheduled = Some(mode);
    }

    fn start(&self, stream: StreamRef) -> bool {
        let mut state = self.state.lock();
        let s = &mut state.streams[Self::slot(stream)];
        assert!(!s.invalidated, "start on an invalidated fake stream");
        s.start_calls += 1;
        if s.scheduled.is_none() {
            // The real start reports failure for unscheduled streams.
            return false;
        }
        s.started = true;
        true
    }

    fn stop(&self, stream: StreamRef) {
        let mut state = self.state.lock();
        let s = &mut state.streams[Self::slot(stream)];
        s.stop_calls += 1;
        s.started = false;
    }

    fn invalidate(&self, stream: StreamRef) {
        let mut state = self.state.lock();
        let s = &mut state.streams[Self::slot(stream)];
        assert!(!s.destroyed, "invalidate on a destroyed fake stream");
        assert!(!s.invalidated, "double invalidate reached the fake subsystem");
        s.invalidate_calls += 1;
        s.invalidated = true;
        s.started = false;
        s.scheduled = None;
    }

    fn retain(&self, stream: StreamRef) {
        let mut state = self.state.lock();
        let s = &mut state.streams[Self::slot(stream)];
        assert!(!s.destroyed, "retain on a destroyed fake stream");
        s.refcount += 1;
    }

    fn release(&self, stream: StreamRef) {
        let context_release = {
            let mut state = self.state.lock();
            let s = &mut state.streams[Self::slot(stream)];
            assert!(!s.destroyed, "release on a destroyed fake stream");
            s.refcount -= 1;
            if s.refcount > 0 {
                None
            } else {
                assert!(
                    s.invalidated,
                    "fake stream destroyed without a prior invalidate"
                );
                s.destroyed = true;
                s.context_releases += 1;
                Some((s.context.release, s.context.info))
            }
        };
        // Outside the lock: releasing the context runs the subscriber's
        // destructor.
        if let Some((release, info)) = context_release {
            unsafe { release(info as *const c_void) };
        }
    }
}

/// Guard counting its own drops; captured by test handlers to observe when
/// the subscriber context is freed.
pub(crate) struct DropProbe {
    drops: Arc<AtomicUsize>,
}

impl DropProbe {
    pub(crate) fn new() -> (DropProbe, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        (
            DropProbe {
                drops: drops.clone(),
            },
            drops,
        )
    }
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
