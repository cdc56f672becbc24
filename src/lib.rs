//! Safe callback bridge over the macOS FSEvents stream API.
//!
//! FSEvents hands filesystem change notifications to a C callback along
//! with an opaque, reference-counted context pointer. This crate wraps
//! that contract: [`EventStream`] owns the stream lifecycle
//! (create / schedule / start / stop / invalidate / release), the
//! subscriber callback lives in a refcounted cell the OS retains and
//! releases through C trampolines, and each delivery is decoded as an
//! [`EventBatch`] that zips the OS's parallel path/flag/id arrays into
//! [`Event`] values.
//!
//! ```no_run
//! # #[cfg(target_os = "macos")] {
//! use std::time::Duration;
//!
//! use fsevent_bridge::{flags, FsEventStream, OsStreamSystem, RunLoopHandle, RunLoopMode};
//!
//! let stream = FsEventStream::create(
//!     OsStreamSystem,
//!     &["/tmp"],
//!     fsevent_bridge::EVENT_ID_SINCE_NOW,
//!     Duration::from_millis(500),
//!     flags::FILE_EVENTS,
//!     |_, events| {
//!         for event in events {
//!             println!("{:#x} {} {}", event.flags, event.id, event.path.display());
//!         }
//!     },
//! )
//! .expect("stream created");
//! stream.schedule(RunLoopHandle::current(), RunLoopMode::Default);
//! stream.start();
//! # }
//! ```
//!
//! Everything except the FSEvents calls themselves is platform
//! independent; the OS sits behind the [`StreamSystem`] trait, which tests
//! replace with an in-memory fake.

mod context;
mod event;
pub mod flags;
mod stream;
mod system;

#[cfg(target_os = "macos")]
mod ffi;
#[cfg(target_os = "macos")]
mod os;

#[cfg(test)]
mod fake;

pub use context::EventHandler;
pub use event::{Event, EventBatch, EventFlags, EventId};
pub use flags::{CreateFlags, EVENT_ID_SINCE_NOW};
pub use stream::{CreationFailed, EventStream};
pub use system::{
    ContextDescriptor, ContextRelease, ContextRetain, CreateRequest, EventStreamCallback,
    RunLoopHandle, RunLoopMode, StreamRef, StreamSystem,
};

#[cfg(target_os = "macos")]
pub use os::{FsEventStream, OsStreamSystem};
