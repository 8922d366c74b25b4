//! Kiosk Controls - kiosk mode controller for shared touch-panel devices

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod guard;
pub mod reconcile;
pub mod registry;
pub mod router;
pub mod store;
pub mod triggers;
pub mod ui;

pub use config::KioskConfig;
pub use device::{CleanupContent, DevicePolicy, Housekeeping, RecordingHousekeeping};
pub use error::{FixSuggestion, KioskError, Result};
pub use event::{Event, EventEmitter, EventKind, EventLog};
pub use guard::{ConfirmationKind, ConfirmationToken, Transition, TransitionGuard};
pub use reconcile::{Reconciler, ToggleLabel, UiProjection};
pub use registry::{Destination, DestinationRegistry};
pub use router::{KioskController, KioskEvent, RawEvent, RouterState};
pub use store::{ConfigBackend, KioskMode, MemoryBackend, ModeStore, SettingKey};
pub use triggers::{ExitTriggerSet, TriggerAction, TriggerKind};
pub use ui::{PanelIds, PanelLayout, RecordingSurface, UiSurface};
