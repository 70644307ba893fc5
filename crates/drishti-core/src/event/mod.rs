//! Realtime event catalog.
//!
//! Two event types flow from the backend to connected clients:
//! `new_issue` (full issue payload) and `status_updated` (minimal
//! payload). The original wire format was duck-typed; here every inbound
//! message is parsed into a tagged variant and malformed payloads are
//! rejected instead of propagating missing fields.

pub mod payload;
pub mod types;

pub use payload::{EventParseError, RealtimeEvent, StatusChange};
pub use types::{EventKind, UnknownEventKind};
