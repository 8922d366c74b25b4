//! Event Module - audit trail of controller decisions
//!
//! Key types:
//! - `Event`: Envelope with id + timestamp + kind
//! - `EventKind`: What the controller decided (sync, requests, confirmations, triggers)
//! - `EventLog`: Thread-safe, append-only log
//! - `EventEmitter`: Trait for dependency injection
//! - `NoopEmitter`: Zero-cost no-op for callers that do not audit

mod emitter;
mod log;

pub use emitter::{EventEmitter, NoopEmitter};
pub use log::{Event, EventKind, EventLog};
