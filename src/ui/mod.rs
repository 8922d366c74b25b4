//! UI Command Layer - panels, widgets and modal dialogs on the touch panel
//!
//! Key types:
//! - `UiSurface`: Trait for the device UI (panels, widget values, prompts)
//! - `PanelIds`: Every widget/feedback id the controller owns, derived from one prefix
//! - `Prompt`, `TextInput`, `Alert`: Modal dialog requests
//! - `PanelLayout` (in [`layout`]): Declarative panel description
//! - `RecordingSurface` (in [`memory`]): Recording fake for tests and simulation

pub mod layout;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use layout::{PanelLayout, PanelLocation};
pub use memory::{RecordingSurface, UiCommand};

/// Device UI command layer
#[async_trait]
pub trait UiSurface: Send + Sync {
    /// Save (create or replace) a panel definition
    async fn save_panel(&self, panel_id: &str, layout: &PanelLayout) -> Result<()>;

    /// Order of a previously saved panel, if the device still has one
    async fn panel_order(&self, panel_id: &str) -> Result<Option<u32>>;

    async fn open_panel(&self, panel_id: &str) -> Result<()>;

    async fn set_widget_value(&self, widget_id: &str, value: &str) -> Result<()>;

    async fn unset_widget_value(&self, widget_id: &str) -> Result<()>;

    /// Option prompt; the answer arrives as a prompt response event
    async fn display_prompt(&self, prompt: &Prompt) -> Result<()>;

    /// Text entry; the answer arrives as a text response event
    async fn display_text_input(&self, input: &TextInput) -> Result<()>;

    async fn display_alert(&self, alert: &Alert) -> Result<()>;
}

/// Ids of everything the controller puts on screen
///
/// All ids share the panel prefix; events whose id lacks it belong to
/// other integrations on the same device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelIds {
    panel_id: String,
}

impl PanelIds {
    pub const SITE_GROUP: &'static str = "siteGroup";
    pub const TOGGLE: &'static str = "toggle";
    pub const PIN: &'static str = "pin";
    pub const WARNING: &'static str = "warning";

    pub fn new(panel_id: impl Into<String>) -> Self {
        Self {
            panel_id: panel_id.into(),
        }
    }

    /// The hidden control panel
    pub fn panel(&self) -> &str {
        &self.panel_id
    }

    /// Launcher button for a visible location
    pub fn launcher(&self, location: PanelLocation) -> String {
        format!("{}{}", self.panel_id, location.as_str())
    }

    pub fn site_group(&self) -> String {
        self.child(Self::SITE_GROUP)
    }

    pub fn toggle(&self) -> String {
        self.child(Self::TOGGLE)
    }

    pub fn pin_feedback(&self, seq: u64) -> String {
        format!("{}-{}", self.child(Self::PIN), seq)
    }

    pub fn warning_feedback(&self, seq: u64) -> String {
        format!("{}-{}", self.child(Self::WARNING), seq)
    }

    /// Whether a panel id belongs to this controller (control panel or launcher)
    pub fn owns_panel(&self, panel_id: &str) -> bool {
        panel_id == self.panel_id
            || PanelLocation::LAUNCHERS
                .iter()
                .any(|location| panel_id == self.launcher(*location))
    }

    /// Strip `{panel_id}-` from a widget or feedback id
    pub fn strip<'a>(&self, id: &'a str) -> Option<&'a str> {
        id.strip_prefix(self.panel_id.as_str())?.strip_prefix('-')
    }

    fn child(&self, name: &str) -> String {
        format!("{}-{}", self.panel_id, name)
    }
}

/// Option prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub title: String,
    pub text: String,
    pub feedback_id: String,
    /// Options in display order; option ids are 1-based
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputType {
    SingleLine,
    Numeric,
    Password,
    #[serde(rename = "PIN")]
    Pin,
}

/// Text entry modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub title: String,
    pub text: String,
    pub feedback_id: String,
    pub input_type: InputType,
    pub placeholder: String,
    pub submit_text: String,
}

/// Transient notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub title: String,
    pub text: String,
    pub duration_secs: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_ids() {
        let ids = PanelIds::new("kioskcontrols");
        assert_eq!(ids.site_group(), "kioskcontrols-siteGroup");
        assert_eq!(ids.toggle(), "kioskcontrols-toggle");
        assert_eq!(ids.pin_feedback(3), "kioskcontrols-pin-3");
        assert_eq!(ids.warning_feedback(7), "kioskcontrols-warning-7");
        assert_eq!(
            ids.launcher(PanelLocation::HomeScreen),
            "kioskcontrolsHomeScreen"
        );
    }

    #[test]
    fn test_strip_requires_separator() {
        let ids = PanelIds::new("kiosk");
        assert_eq!(ids.strip("kiosk-toggle"), Some("toggle"));
        assert_eq!(ids.strip("kioskother-toggle"), None);
        assert_eq!(ids.strip("other-toggle"), None);
    }

    #[test]
    fn test_owns_panel_includes_launchers() {
        let ids = PanelIds::new("kiosk");
        assert!(ids.owns_panel("kiosk"));
        assert!(ids.owns_panel("kioskHomeScreen"));
        assert!(ids.owns_panel("kioskControlPanel"));
        assert!(!ids.owns_panel("camera_presets"));
        assert!(!ids.owns_panel("kiosk_presets"));
        assert!(!ids.owns_panel("kioskHidden"));
    }
}
