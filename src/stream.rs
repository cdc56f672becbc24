//! Stream lifecycle bridge.
//!
//! EventStream owns one OS stream and walks it through the
//! create / schedule / start / stop / invalidate / release lifecycle, with
//! the subscriber context reference-counted behind the scenes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use crate::context::{deliver_events, StreamContext};
use crate::event::{EventBatch, EventId};
use crate::flags::{self, CreateFlags};
use crate::system::{CreateRequest, RunLoopHandle, RunLoopMode, StreamRef, StreamSystem};

/// The OS refused to create a stream.
///
/// The only failure the bridge reports; every later lifecycle call is
/// unconditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the OS refused to create the event stream")]
pub struct CreationFailed;

/// One OS event stream plus the subsystem it talks to.
///
/// Reference counting of the underlying handle is manual, mirroring the C
/// API: the reference taken at creation is given back with [`release`],
/// after [`invalidate`].
///
/// [`release`]: EventStream::release
/// [`invalidate`]: EventStream::invalidate
pub struct EventStream<S: StreamSystem> {
    system: S,
    raw: StreamRef,
    /// Set once by invalidate; guards the OS against a second invalidation
    /// and this bridge against post-invalidate scheduling calls.
    invalidated: AtomicBool,
}

impl<S: StreamSystem> EventStream<S> {
    /// Create a stream watching `paths`.
    ///
    /// `handler` runs on whichever run loop the stream is scheduled on,
    /// once per delivery, with the originating stream's identity and the
    /// batch of events. `since_when` is the event id to resume from
    /// (EVENT_ID_SINCE_NOW for changes from now on); `latency` is the
    /// coalescing window the OS may batch events within.
    ///
    /// The handler context starts with a reference count of one, held by
    /// the created stream. Flag bits that would change the callback's
    /// payload type are reserved by the bridge and stripped from `flags`.
    pub fn create<P, F>(
        system: S,
        paths: &[P],
        since_when: EventId,
        latency: Duration,
        flags: CreateFlags,
        handler: F,
    ) -> Result<EventStream<S>, CreationFailed>
    where
        P: AsRef<Path>,
        F: FnMut(StreamRef, EventBatch<'_>) + Send + 'static,
    {
        let context = StreamContext::new(Box::new(handler));
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let request = CreateRequest {
            callback: deliver_events,
            context: StreamContext::descriptor(&context),
            paths: &paths,
            since_when,
            latency,
            flags: flags & !flags::PAYLOAD_BITS,
        };
        match system.create_stream(&request) {
            Some(raw) => {
                // The subsystem retained the context during creation.
                // Dropping our Arc here hands over the initial reference,
                // leaving the subsystem's as the only one.
                Ok(EventStream {
                    system,
                    raw,
                    invalidated: AtomicBool::new(false),
                })
            }
            None => {
                // The refused creation never touched the context; dropping
                // the Arc frees it together with the handler.
                debug!("stream creation refused for {} path(s)", paths.len());
                Err(CreationFailed)
            }
        }
    }

    /// Attach the stream to `run_loop` so deliveries fire in `mode`.
    pub fn schedule(&self, run_loop: RunLoopHandle, mode: RunLoopMode) {
        self.assert_live("schedule");
        self.system.schedule(self.raw, run_loop, mode);
    }

    /// Begin event delivery, or resume it after a stop.
    pub fn start(&self) {
        self.assert_live("start");
        if !self.system.start(self.raw) {
            // The OS reports failure for streams that were never scheduled.
            warn!("the OS refused to start stream {:?}", self.raw);
        }
    }

    /// Pause event delivery. The stream and its resume position survive; a
    /// later start picks up where it left off.
    pub fn stop(&self) {
        self.assert_live("stop");
        self.system.stop(self.raw);
    }

    /// Detach the stream from its run loops and tear down delivery.
    ///
    /// Safe to call more than once; only the first call reaches the OS.
    /// Required before the final release.
    pub fn invalidate(&self) {
        if !self.invalidated.swap(true, Ordering::SeqCst) {
            self.system.invalidate(self.raw);
        }
    }

    /// Take an extra reference on the OS stream handle.
    pub fn retain(&self) {
        self.system.retain(self.raw);
    }

    /// Drop one reference on the OS stream handle.
    ///
    /// Releases pair one-to-one with retains, plus one for the reference
    /// held since creation. The last release destroys the handle and frees
    /// the subscriber context with it.
    pub fn release(&self) {
        self.system.release(self.raw);
    }

    /// Identity of the OS stream, the same value the handler receives.
    pub fn raw(&self) -> StreamRef {
        self.raw
    }

    fn assert_live(&self, operation: &str) {
        assert!(
            !self.invalidated.load(Ordering::SeqCst),
            "{} called on an invalidated event stream",
            operation
        );
    }
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod tests;
