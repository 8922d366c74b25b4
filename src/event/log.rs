//! EventLog - append-only audit trail
//!
//! - Event: envelope with id + timestamp + kind
//! - EventKind: one variant per controller decision
//! - EventLog: thread-safe, append-only log

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::CleanupContent;
use crate::guard::ConfirmationKind;
use crate::store::KioskMode;
use crate::triggers::{TriggerAction, TriggerKind};

/// Single entry in the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since controller start (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // RECONCILER
    // ═══════════════════════════════════════════
    Synced {
        /// 0-based destination index, if any matched
        selected: Option<usize>,
        mode: KioskMode,
    },

    // ═══════════════════════════════════════════
    // TRANSITION GUARD
    // ═══════════════════════════════════════════
    ModeRequested {
        mode: KioskMode,
        /// Empty-URL check bypassed by an accepted confirmation
        forced: bool,
    },
    UrlRequested {
        index: usize,
        url: String,
    },
    ConfirmationRaised {
        kind: ConfirmationKind,
        seq: u64,
    },
    ConfirmationResolved {
        kind: ConfirmationKind,
        seq: u64,
        accepted: bool,
    },
    CleanupRun {
        content: Vec<CleanupContent>,
    },

    // ═══════════════════════════════════════════
    // EVENT ROUTER
    // ═══════════════════════════════════════════
    PanelOpened,
    /// Panel click while kiosk mode is on and no unlock path exists
    PanelLocked,
    PinAccepted,
    PinRejected,
    TriggerFired {
        trigger: TriggerKind,
        actions: Vec<TriggerAction>,
    },
    EventIgnored {
        reason: String,
    },
    OperationFailed {
        operation: String,
        error: String,
    },
}

impl EventKind {
    /// Check if this event records a requested store mutation
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::ModeRequested { .. } | Self::UrlRequested { .. })
    }
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    /// Create a new event log (call at controller start)
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        self.events.write().push(event);
        id
    }

    /// Get all events (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Event kinds only, in order
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.read().iter().map(|e| e.kind.clone()).collect()
    }

    /// Requested store mutations only
    pub fn mutations(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind.is_mutation())
            .collect()
    }

    /// Serialize to JSON for export
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.events()).unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .finish()
    }
}
