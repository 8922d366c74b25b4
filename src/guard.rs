//! Transition Guard - validated mutations of the mode store
//!
//! Every write to kiosk mode or kiosk URL goes through here. The guard
//! enforces one rule at the write boundary: kiosk mode is never enabled
//! with an empty URL unless the user explicitly confirmed it.
//!
//! Confirmations are tracked as [`ConfirmationToken`]s in
//! [`PendingConfirmations`]: one slot per kind, a new request replaces the
//! previous one, and a token is consumed by the first response of its kind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::device::{CleanupContent, Housekeeping};
use crate::error::{KioskError, Result};
use crate::event::{EventEmitter, EventKind};
use crate::reconcile::Reconciler;
use crate::registry::{normalize_url, DestinationRegistry};
use crate::store::{KioskMode, ModeStore};
use crate::ui::{PanelIds, Prompt, UiSurface};

const NO_URL_WARNING: &str = "Warning: No Kiosk URL configured. The device will show as Out of Service. Are you sure you want to enable Kiosk Mode?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    /// "Enable kiosk mode without a URL?"
    NoUrlWarning,
    /// PIN entry guarding the control panel
    PinChallenge,
}

impl ConfirmationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoUrlWarning => "no_url_warning",
            Self::PinChallenge => "pin_challenge",
        }
    }
}

/// Identifies one outstanding dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmationToken {
    pub kind: ConfirmationKind,
    pub seq: u64,
}

/// At most one outstanding confirmation per kind
#[derive(Debug, Default)]
pub struct PendingConfirmations {
    next_seq: AtomicU64,
    slots: Mutex<FxHashMap<ConfirmationKind, u64>>,
}

impl PendingConfirmations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new confirmation, replacing any outstanding one of the same kind
    pub fn raise(&self, kind: ConfirmationKind) -> ConfirmationToken {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = self.slots.lock().insert(kind, seq) {
            debug!(kind = kind.as_str(), previous, seq, "Replaced pending confirmation");
        }
        ConfirmationToken { kind, seq }
    }

    /// Consume the outstanding confirmation of `token.kind`.
    ///
    /// The slot is emptied whether or not the sequence matches.
    pub fn take(&self, token: ConfirmationToken) -> Result<()> {
        match self.slots.lock().remove(&token.kind) {
            Some(seq) if seq == token.seq => Ok(()),
            _ => Err(KioskError::ConfirmationMismatch {
                kind: token.kind.as_str().to_string(),
            }),
        }
    }

    pub fn pending(&self, kind: ConfirmationKind) -> Option<ConfirmationToken> {
        self.slots
            .lock()
            .get(&kind)
            .map(|&seq| ConfirmationToken { kind, seq })
    }
}

/// What a guarded request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The store was asked to switch to this mode
    Requested(KioskMode),
    /// Nothing written yet; waiting for the user
    AwaitingConfirmation(ConfirmationToken),
}

/// Options that shape guarded transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOptions {
    /// Dialog title
    pub title: String,
    pub cleanup_on_enable: bool,
    pub cleanup_content: Vec<CleanupContent>,
}

/// Validates and performs mode/URL mutations
#[derive(Clone)]
pub struct TransitionGuard {
    store: ModeStore,
    reconciler: Reconciler,
    ui: Arc<dyn UiSurface>,
    housekeeping: Arc<dyn Housekeeping>,
    confirmations: Arc<PendingConfirmations>,
    registry: DestinationRegistry,
    ids: PanelIds,
    options: GuardOptions,
    events: Arc<dyn EventEmitter>,
}

impl TransitionGuard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: ModeStore,
        reconciler: Reconciler,
        ui: Arc<dyn UiSurface>,
        housekeeping: Arc<dyn Housekeeping>,
        confirmations: Arc<PendingConfirmations>,
        ids: PanelIds,
        options: GuardOptions,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        let registry = reconciler.registry().clone();
        Self {
            store,
            reconciler,
            ui,
            housekeeping,
            confirmations,
            registry,
            ids,
            options,
            events,
        }
    }

    pub fn confirmations(&self) -> &Arc<PendingConfirmations> {
        &self.confirmations
    }

    /// Enable kiosk mode, or ask for confirmation when no URL is set
    #[instrument(skip(self))]
    pub async fn request_enable(&self) -> Result<Transition> {
        let url = self.store.get_url().await?;
        if normalize_url(&url).is_empty() {
            info!("No kiosk URL set, asking for confirmation");
            let token = self.confirmations.raise(ConfirmationKind::NoUrlWarning);
            self.events.emit(EventKind::ConfirmationRaised {
                kind: token.kind,
                seq: token.seq,
            });
            self.ui
                .display_prompt(&Prompt {
                    title: self.options.title.clone(),
                    text: NO_URL_WARNING.to_string(),
                    feedback_id: self.ids.warning_feedback(token.seq),
                    options: vec!["Yes".to_string(), "No".to_string()],
                })
                .await?;
            return Ok(Transition::AwaitingConfirmation(token));
        }

        self.enable(false).await
    }

    #[instrument(skip(self))]
    pub async fn request_disable(&self) -> Result<Transition> {
        info!("Disabling kiosk mode");
        self.store.set_mode(KioskMode::Disabled).await?;
        self.events.emit(EventKind::ModeRequested {
            mode: KioskMode::Disabled,
            forced: false,
        });
        Ok(Transition::Requested(KioskMode::Disabled))
    }

    /// Flip the current mode.
    ///
    /// Read-then-act: a concurrent external change between the read and
    /// the write is not detected.
    #[instrument(skip(self))]
    pub async fn request_toggle(&self) -> Result<Transition> {
        match self.store.get_mode().await?.toggled() {
            KioskMode::Enabled => self.request_enable().await,
            KioskMode::Disabled => self.request_disable().await,
        }
    }

    /// Answer to the empty-URL warning.
    ///
    /// Accepted: enable regardless of the URL. Rejected: no write, just
    /// resync the UI so the toggle shows the real mode again.
    #[instrument(skip(self))]
    pub async fn resolve_confirmation(
        &self,
        token: ConfirmationToken,
        accepted: bool,
    ) -> Result<Transition> {
        if token.kind != ConfirmationKind::NoUrlWarning {
            return Err(KioskError::ConfirmationMismatch {
                kind: token.kind.as_str().to_string(),
            });
        }
        self.confirmations.take(token)?;
        self.events.emit(EventKind::ConfirmationResolved {
            kind: token.kind,
            seq: token.seq,
            accepted,
        });

        if accepted {
            info!("Warning accepted, enabling kiosk mode");
            self.enable(true).await
        } else {
            info!("Warning rejected, not enabling kiosk mode");
            let projection = self.reconciler.sync().await?;
            Ok(Transition::Requested(projection.mode))
        }
    }

    /// Point the kiosk at a registry entry; the mode is left alone
    #[instrument(skip(self))]
    pub async fn select_destination(&self, index: usize) -> Result<()> {
        let dest = self.registry.select(index)?;
        info!(label = %dest.label, "Setting kiosk URL to {}", dest.url);
        self.store.set_url(&dest.url).await?;
        self.events.emit(EventKind::UrlRequested {
            index,
            url: dest.url.clone(),
        });
        Ok(())
    }

    /// Session cleanup with the configured content
    pub async fn run_cleanup(&self) -> Result<()> {
        self.housekeeping
            .run_cleanup(&self.options.cleanup_content)
            .await?;
        self.events.emit(EventKind::CleanupRun {
            content: self.options.cleanup_content.clone(),
        });
        Ok(())
    }

    async fn enable(&self, forced: bool) -> Result<Transition> {
        if self.options.cleanup_on_enable {
            if let Err(e) = self.run_cleanup().await {
                warn!("Cleanup before enabling kiosk mode failed: {}", e);
            }
        }

        info!(forced, "Enabling kiosk mode");
        self.store.set_mode(KioskMode::Enabled).await?;
        self.events.emit(EventKind::ModeRequested {
            mode: KioskMode::Enabled,
            forced,
        });
        Ok(Transition::Requested(KioskMode::Enabled))
    }
}
