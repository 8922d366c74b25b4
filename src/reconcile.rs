//! Reconciler - derives the panel's widget state from the mode store
//!
//! `sync()` never trusts anything it computed earlier: it reads mode and URL
//! fresh, computes a [`UiProjection`], and writes it to the UI. The two reads
//! are independent, so a concurrent change can slip between them; the change
//! notification that follows triggers another `sync()` and the UI converges.
//! Calling `sync()` repeatedly or concurrently is harmless, the last one to
//! finish wins.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::event::{EventEmitter, EventKind};
use crate::registry::DestinationRegistry;
use crate::store::{KioskMode, ModeStore};
use crate::ui::{PanelIds, PanelLayout, UiSurface};

/// Label on the mode toggle button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToggleLabel {
    Enable,
    Disable,
}

impl ToggleLabel {
    pub fn for_mode(mode: KioskMode) -> Self {
        match mode {
            KioskMode::Enabled => Self::Disable,
            KioskMode::Disabled => Self::Enable,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Enable => "Enable Kiosk Mode",
            Self::Disable => "Disable Kiosk Mode",
        }
    }
}

/// Widget state derived from one reading of the mode store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiProjection {
    /// 0-based index of the highlighted destination
    pub selected: Option<usize>,
    pub mode: KioskMode,
    pub toggle: ToggleLabel,
}

impl UiProjection {
    pub fn compute(registry: &DestinationRegistry, mode: KioskMode, url: &str) -> Self {
        Self {
            selected: registry.match_url(url),
            mode,
            toggle: ToggleLabel::for_mode(mode),
        }
    }

    /// Value for the group selector (1-based), `None` to clear it
    pub fn selector_value(&self) -> Option<String> {
        self.selected.map(|i| (i + 1).to_string())
    }
}

/// Writes the projection of the current store state to the UI
#[derive(Clone)]
pub struct Reconciler {
    store: ModeStore,
    ui: Arc<dyn UiSurface>,
    registry: DestinationRegistry,
    ids: PanelIds,
    name: String,
    events: Arc<dyn EventEmitter>,
}

impl Reconciler {
    pub fn new(
        store: ModeStore,
        ui: Arc<dyn UiSurface>,
        registry: DestinationRegistry,
        ids: PanelIds,
        name: impl Into<String>,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            store,
            ui,
            registry,
            ids,
            name: name.into(),
            events,
        }
    }

    /// Re-read the store and bring the UI in line with it
    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<UiProjection> {
        let mode = self.store.get_mode().await?;
        let url = self.store.get_url().await?;
        let projection = UiProjection::compute(&self.registry, mode, &url);

        self.apply(&projection).await?;

        debug!(
            selected = ?projection.selected,
            mode = %projection.mode,
            "Synced kiosk UI"
        );
        self.events.emit(EventKind::Synced {
            selected: projection.selected,
            mode: projection.mode,
        });
        Ok(projection)
    }

    /// Write a projection: re-save the panel (toggle label), then the selector
    pub async fn apply(&self, projection: &UiProjection) -> Result<()> {
        self.save_control_panel(projection.toggle).await?;

        let selector = self.ids.site_group();
        match projection.selector_value() {
            Some(value) => self.ui.set_widget_value(&selector, &value).await,
            None => self.ui.unset_widget_value(&selector).await,
        }
    }

    /// Save the hidden control panel, keeping any order the device already has
    pub async fn save_control_panel(&self, toggle: ToggleLabel) -> Result<()> {
        let panel_id = self.ids.panel();
        let order = self.panel_order(panel_id).await;
        let layout =
            PanelLayout::control_panel(&self.name, &self.ids, &self.registry, toggle.text(), order);
        self.ui.save_panel(panel_id, &layout).await
    }

    pub(crate) async fn panel_order(&self, panel_id: &str) -> Option<u32> {
        match self.ui.panel_order(panel_id).await {
            Ok(order) => order,
            Err(e) => {
                warn!(panel_id, "Could not read panel order: {}", e);
                None
            }
        }
    }

    pub fn registry(&self) -> &DestinationRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;
    use crate::registry::Destination;
    use crate::store::{MemoryBackend, SettingKey};
    use crate::ui::RecordingSurface;
    use pretty_assertions::assert_eq;

    struct Fixture {
        backend: Arc<MemoryBackend>,
        surface: Arc<RecordingSurface>,
        log: EventLog,
        reconciler: Reconciler,
    }

    fn fixture(mode: &str, url: &str) -> Fixture {
        let backend = Arc::new(MemoryBackend::with_kiosk(mode, url));
        let surface = Arc::new(RecordingSurface::new());
        let log = EventLog::new();
        let registry = DestinationRegistry::new(vec![
            Destination::new("A", "https://a.example"),
            Destination::new("B", "https://b.example"),
        ])
        .unwrap();
        let reconciler = Reconciler::new(
            ModeStore::new(backend.clone()),
            surface.clone(),
            registry,
            PanelIds::new("kiosk"),
            "Kiosk Controls",
            Arc::new(log.clone()),
        );
        Fixture {
            backend,
            surface,
            log,
            reconciler,
        }
    }

    #[test]
    fn test_projection_compute() {
        let registry =
            DestinationRegistry::new(vec![Destination::new("A", "https://a.example")]).unwrap();
        let p = UiProjection::compute(&registry, KioskMode::Enabled, "https://a.example?x=1");
        assert_eq!(p.selected, Some(0));
        assert_eq!(p.selector_value().as_deref(), Some("1"));
        assert_eq!(p.toggle, ToggleLabel::Disable);

        let p = UiProjection::compute(&registry, KioskMode::Disabled, "");
        assert_eq!(p.selected, None);
        assert_eq!(p.selector_value(), None);
        assert_eq!(p.toggle.text(), "Enable Kiosk Mode");
    }

    #[tokio::test]
    async fn test_sync_selects_matching_destination() {
        let f = fixture("Off", "https://a.example?x=1");

        let projection = f.reconciler.sync().await.unwrap();

        assert_eq!(projection.selected, Some(0));
        assert_eq!(
            f.surface.widget_value("kiosk-siteGroup").as_deref(),
            Some("1")
        );
        let panel = f.surface.panel("kiosk").unwrap();
        assert_eq!(
            panel.widget("kiosk-toggle").unwrap().name.as_deref(),
            Some("Enable Kiosk Mode")
        );
        assert_eq!(
            f.log.kinds(),
            vec![EventKind::Synced {
                selected: Some(0),
                mode: KioskMode::Disabled
            }]
        );
    }

    #[tokio::test]
    async fn test_sync_clears_selection_without_match() {
        let f = fixture("On", "https://b.example");
        f.reconciler.sync().await.unwrap();
        assert_eq!(
            f.surface.widget_value("kiosk-siteGroup").as_deref(),
            Some("2")
        );

        f.backend
            .external_set(SettingKey::KioskUrl, "https://elsewhere.example");
        let projection = f.reconciler.sync().await.unwrap();

        assert_eq!(projection.selected, None);
        assert_eq!(f.surface.widget_value("kiosk-siteGroup"), None);
        assert_eq!(projection.toggle, ToggleLabel::Disable);
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let f = fixture("On", "https://a.example");
        let first = f.reconciler.sync().await.unwrap();
        let second = f.reconciler.sync().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            f.surface.widget_value("kiosk-siteGroup").as_deref(),
            Some("1")
        );
        assert!(f.backend.writes().is_empty());
    }

    #[tokio::test]
    async fn test_sync_keeps_saved_panel_order() {
        let f = fixture("Off", "");
        let surface = Arc::new(RecordingSurface::new().with_order("kiosk", 5));
        let reconciler = Reconciler::new(
            ModeStore::new(f.backend.clone()),
            surface.clone(),
            f.reconciler.registry().clone(),
            PanelIds::new("kiosk"),
            "Kiosk Controls",
            Arc::new(EventLog::new()),
        );

        reconciler.sync().await.unwrap();
        assert_eq!(surface.panel("kiosk").unwrap().order, Some(5));
    }

    #[tokio::test]
    async fn test_sync_fails_when_store_unavailable() {
        let f = fixture("Off", "");
        f.backend.set_offline(true);

        assert!(f.reconciler.sync().await.is_err());
        assert!(f.surface.commands().is_empty());
        assert!(f.log.is_empty());
    }
}
