//! Event Router - the controller's event loop
//!
//! [`KioskController`] wires the store, reconciler, guard and trigger set
//! together and dispatches every inbound event:
//!
//! ```text
//! RawEvent ─decode─► KioskEvent ─► TransitionGuard ─► ModeStore
//!                                                        │ change
//!                          UI ◄─ Reconciler::sync() ◄────┘
//! ```
//!
//! The router is the root of its own loop: errors are logged and recorded
//! in the audit log, never propagated. Events are handled one at a time in
//! arrival order.

mod inbound;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::KioskConfig;
use crate::device::{DevicePolicy, Housekeeping};
use crate::error::{KioskError, Result};
use crate::event::{EventEmitter, EventKind, EventLog};
use crate::guard::{ConfirmationKind, GuardOptions, PendingConfirmations, TransitionGuard};
use crate::reconcile::{Reconciler, UiProjection};
use crate::store::{ConfigBackend, KioskMode, ModeStore};
use crate::triggers::{ExitTriggerSet, TriggerAction, TriggerKind};
use crate::ui::{Alert, InputType, PanelIds, PanelLayout, PanelLocation, TextInput, UiSurface};

pub use inbound::{KioskEvent, PromptKind, RawEvent, TextKind, WidgetPress};

const PIN_PROMPT: &str = "Please Enter PIN";
const INVALID_PIN_TITLE: &str = "Invalid PIN";
const INVALID_PIN_TEXT: &str = "The PIN entered was invalid, please try again";
const INVALID_PIN_SECS: u32 = 5;

/// Whether the control panel is directly reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// Kiosk mode on: the panel sits behind the PIN challenge
    Locked,
    /// Kiosk mode off: panel opens on click
    Unlocked,
}

impl From<KioskMode> for RouterState {
    fn from(mode: KioskMode) -> Self {
        match mode {
            KioskMode::Enabled => Self::Locked,
            KioskMode::Disabled => Self::Unlocked,
        }
    }
}

/// The kiosk controller
pub struct KioskController {
    name: String,
    pin: Option<String>,
    pin_unlock: bool,
    ids: PanelIds,
    backend: Arc<dyn ConfigBackend>,
    store: ModeStore,
    ui: Arc<dyn UiSurface>,
    reconciler: Reconciler,
    guard: TransitionGuard,
    triggers: ExitTriggerSet,
    policy: DevicePolicy,
    log: EventLog,
}

impl KioskController {
    /// Build a controller from a validated config
    pub fn new(
        config: KioskConfig,
        backend: Arc<dyn ConfigBackend>,
        ui: Arc<dyn UiSurface>,
        housekeeping: Arc<dyn Housekeeping>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = config.registry()?;

        let log = EventLog::new();
        let events: Arc<dyn EventEmitter> = Arc::new(log.clone());
        let ids = PanelIds::new(config.panel_id.as_str());
        let store = ModeStore::new(backend.clone());

        let reconciler = Reconciler::new(
            store.clone(),
            ui.clone(),
            registry,
            ids.clone(),
            config.name.as_str(),
            events.clone(),
        );
        let guard = TransitionGuard::new(
            store.clone(),
            reconciler.clone(),
            ui.clone(),
            housekeeping,
            Arc::new(PendingConfirmations::new()),
            ids.clone(),
            GuardOptions {
                title: config.name.clone(),
                cleanup_on_enable: config.cleanup_on_enable,
                cleanup_content: config.cleanup_content.clone(),
            },
            events,
        );

        Ok(Self {
            pin_unlock: config.pin_unlock_enabled(),
            triggers: ExitTriggerSet::from_config(&config),
            policy: DevicePolicy::from_config(&config),
            name: config.name,
            pin: config.pin,
            ids,
            backend,
            store,
            ui,
            reconciler,
            guard,
            log,
        })
    }

    /// Apply the device policy, save the panels, sync the UI
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<UiProjection> {
        let applied = self.policy.apply(&self.backend).await;
        debug!(applied, "Device policy applied");

        for location in PanelLocation::LAUNCHERS {
            let launcher_id = self.ids.launcher(location);
            let order = self.reconciler.panel_order(&launcher_id).await;
            let layout = PanelLayout::launcher(&self.name, location, order);
            self.ui.save_panel(&launcher_id, &layout).await?;
        }

        let projection = self.reconciler.sync().await?;
        info!(mode = %projection.mode, "Kiosk controller started");
        Ok(projection)
    }

    /// Handle inbound events and store changes until the inbound channel closes
    pub async fn run(&self, mut events: mpsc::Receiver<RawEvent>) {
        let mut watch = self.store.watch();
        let mut watching = true;

        loop {
            tokio::select! {
                // store changes first, so every write is reflected before the next event
                biased;

                change = watch.changed(), if watching => match change {
                    Some(change) => {
                        debug!(?change, "Mode store changed");
                        if let Err(e) = self.reconciler.sync().await {
                            self.report("sync", e);
                        }
                    }
                    None => {
                        warn!("Mode store notifications closed");
                        watching = false;
                    }
                },

                raw = events.recv() => match raw {
                    Some(raw) => self.process(raw).await,
                    None => break,
                },
            }
        }

        debug!("Inbound event channel closed");
    }

    /// Dispatch one event, logging any failure
    pub async fn process(&self, raw: RawEvent) {
        let name = raw.name();
        if let Err(e) = self.dispatch(raw).await {
            self.report(name, e);
        }
    }

    pub async fn dispatch(&self, raw: RawEvent) -> Result<()> {
        let event = raw.decode(&self.ids)?;
        self.handle(event).await
    }

    // skip_all keeps entered PINs out of the span
    #[instrument(skip_all)]
    pub async fn handle(&self, event: KioskEvent) -> Result<()> {
        match event {
            KioskEvent::PanelClicked => self.on_panel_clicked().await,
            KioskEvent::WidgetPressed(WidgetPress::Destination(index)) => {
                self.guard.select_destination(index).await
            }
            KioskEvent::WidgetPressed(WidgetPress::Toggle) => {
                self.guard.request_toggle().await.map(|_| ())
            }
            KioskEvent::TextResponse(TextKind::Pin { token }, text) => {
                self.guard.confirmations().take(token)?;
                self.on_pin_entered(token.seq, &text).await
            }
            KioskEvent::PromptResponse(PromptKind::NoUrlWarning { token }, accepted) => {
                self.guard
                    .resolve_confirmation(token, accepted)
                    .await
                    .map(|_| ())
            }
            KioskEvent::ExitTrigger(trigger) => self.on_trigger(trigger).await,
        }
    }

    /// Current router state, read from the store
    pub async fn state(&self) -> Result<RouterState> {
        Ok(self.store.get_mode().await?.into())
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn guard(&self) -> &TransitionGuard {
        &self.guard
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn ids(&self) -> &PanelIds {
        &self.ids
    }

    async fn on_panel_clicked(&self) -> Result<()> {
        match self.state().await? {
            RouterState::Unlocked => self.open_panel().await,
            RouterState::Locked if self.pin_unlock => self.raise_pin_challenge().await,
            RouterState::Locked => {
                debug!("Panel locked while kiosk mode is on");
                self.log.emit(EventKind::PanelLocked);
                Ok(())
            }
        }
    }

    async fn raise_pin_challenge(&self) -> Result<()> {
        let token = self
            .guard
            .confirmations()
            .raise(ConfirmationKind::PinChallenge);
        self.log.emit(EventKind::ConfirmationRaised {
            kind: token.kind,
            seq: token.seq,
        });

        self.ui
            .display_text_input(&TextInput {
                title: self.name.clone(),
                text: PIN_PROMPT.to_string(),
                feedback_id: self.ids.pin_feedback(token.seq),
                input_type: InputType::Pin,
                placeholder: PIN_PROMPT.to_string(),
                submit_text: "Submit".to_string(),
            })
            .await
    }

    async fn on_pin_entered(&self, seq: u64, text: &str) -> Result<()> {
        let accepted = self.pin.as_deref() == Some(text);
        self.log.emit(EventKind::ConfirmationResolved {
            kind: ConfirmationKind::PinChallenge,
            seq,
            accepted,
        });

        if accepted {
            info!("Correct PIN entered, opening panel");
            self.log.emit(EventKind::PinAccepted);
            self.open_panel().await
        } else {
            info!("Invalid PIN entered");
            self.log.emit(EventKind::PinRejected);
            self.ui
                .display_alert(&Alert {
                    title: INVALID_PIN_TITLE.to_string(),
                    text: INVALID_PIN_TEXT.to_string(),
                    duration_secs: INVALID_PIN_SECS,
                })
                .await
        }
    }

    async fn open_panel(&self) -> Result<()> {
        self.ui.open_panel(self.ids.panel()).await?;
        self.log.emit(EventKind::PanelOpened);
        Ok(())
    }

    async fn on_trigger(&self, trigger: TriggerKind) -> Result<()> {
        let mode = self.store.get_mode().await?;
        let actions = self.triggers.evaluate(trigger, mode);
        if actions.is_empty() {
            debug!(%trigger, %mode, "Trigger has no effect");
            return Ok(());
        }

        info!(%trigger, ?actions, "Exit trigger fired");
        self.log.emit(EventKind::TriggerFired {
            trigger,
            actions: actions.clone(),
        });

        for action in actions {
            match action {
                TriggerAction::Cleanup => {
                    if let Err(e) = self.guard.run_cleanup().await {
                        self.report("cleanup", e);
                    }
                }
                TriggerAction::Enable => {
                    self.guard.request_enable().await?;
                }
                TriggerAction::Disable => {
                    self.guard.request_disable().await?;
                }
            }
        }
        Ok(())
    }

    fn report(&self, operation: &str, error: KioskError) {
        match &error {
            KioskError::ForeignEvent { .. } | KioskError::MalformedEvent { .. } => {
                trace!(operation, "Ignoring event: {}", error);
            }
            KioskError::ConfirmationMismatch { .. } => {
                debug!(operation, "Ignoring stale response: {}", error);
            }
            _ => warn!(operation, code = error.code(), "{}", error),
        }

        let kind = if error.is_ignorable() {
            EventKind::EventIgnored {
                reason: error.to_string(),
            }
        } else {
            EventKind::OperationFailed {
                operation: operation.to_string(),
                error: error.to_string(),
            }
        };
        self.log.emit(kind);
    }
}

impl std::fmt::Debug for KioskController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KioskController")
            .field("ids", &self.ids)
            .field("triggers", &self.triggers)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}
