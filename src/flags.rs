// Stream creation flags and well-known event id values.
// Values mirror the FSEvents platform header.

use crate::event::EventId;

/// Flag bits accepted by stream creation
pub type CreateFlags = u32;

/// Default stream behavior
pub const NONE: CreateFlags = 0x0000_0000;

/// Deliver promptly after a change instead of waiting out the latency window
pub const NO_DEFER: CreateFlags = 0x0000_0002;

/// Also report the watched directories themselves moving or disappearing
pub const WATCH_ROOT: CreateFlags = 0x0000_0004;

/// Suppress events caused by this process
pub const IGNORE_SELF: CreateFlags = 0x0000_0008;

/// Report individual file changes instead of per-directory changes
pub const FILE_EVENTS: CreateFlags = 0x0000_0010;

/// Tag events caused by this process in their flags
pub const MARK_SELF: CreateFlags = 0x0000_0020;

/// Requests CF-typed path payloads; reserved, see PAYLOAD_BITS
pub(crate) const USE_CF_TYPES: CreateFlags = 0x0000_0001;

/// Requests dictionary path payloads; reserved, see PAYLOAD_BITS
pub(crate) const USE_EXTENDED_DATA: CreateFlags = 0x0000_0040;

/// Bits the bridge strips from caller flags at creation: they change the
/// C type of the callback's path array, which the delivery trampoline
/// decodes as plain C strings.
pub(crate) const PAYLOAD_BITS: CreateFlags = USE_CF_TYPES | USE_EXTENDED_DATA;

/// Subscribe from "now": no historical replay
pub const EVENT_ID_SINCE_NOW: EventId = u64::MAX;

#[cfg(test)]
#[path = "flags_test.rs"]
mod tests;
