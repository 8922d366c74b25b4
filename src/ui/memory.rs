//! RecordingSurface - UI fake that records every command it receives

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;

use super::{Alert, PanelLayout, Prompt, TextInput, UiSurface};
use crate::error::{KioskError, Result};

/// A command sent to the UI layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum UiCommand {
    SavePanel { panel_id: String, layout: PanelLayout },
    OpenPanel { panel_id: String },
    SetWidgetValue { widget_id: String, value: String },
    UnsetWidgetValue { widget_id: String },
    Prompt(Prompt),
    TextInput(TextInput),
    Alert(Alert),
}

/// Records commands and keeps the resulting widget state
#[derive(Default)]
pub struct RecordingSurface {
    commands: RwLock<Vec<UiCommand>>,
    widget_values: RwLock<FxHashMap<String, String>>,
    panels: RwLock<FxHashMap<String, PanelLayout>>,
    orders: RwLock<FxHashMap<String, u32>>,
    failing: AtomicBool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a panel was saved earlier with the given order
    pub fn with_order(self, panel_id: &str, order: u32) -> Self {
        self.orders.write().insert(panel_id.to_string(), order);
        self
    }

    /// Make every command fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<UiCommand> {
        self.commands.read().clone()
    }

    pub fn clear(&self) {
        self.commands.write().clear();
    }

    /// Current value of a widget, after all set/unset commands
    pub fn widget_value(&self, widget_id: &str) -> Option<String> {
        self.widget_values.read().get(widget_id).cloned()
    }

    /// Last saved layout for a panel
    pub fn panel(&self, panel_id: &str) -> Option<PanelLayout> {
        self.panels.read().get(panel_id).cloned()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.filter(|c| match c {
            UiCommand::Prompt(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn text_inputs(&self) -> Vec<TextInput> {
        self.filter(|c| match c {
            UiCommand::TextInput(t) => Some(t.clone()),
            _ => None,
        })
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.filter(|c| match c {
            UiCommand::Alert(a) => Some(a.clone()),
            _ => None,
        })
    }

    pub fn opened_panels(&self) -> Vec<String> {
        self.filter(|c| match c {
            UiCommand::OpenPanel { panel_id } => Some(panel_id.clone()),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&UiCommand) -> Option<T>) -> Vec<T> {
        self.commands.read().iter().filter_map(f).collect()
    }

    fn record(&self, name: &str, command: UiCommand) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(KioskError::UiCommandFailed {
                command: name.to_string(),
                reason: "surface unavailable".to_string(),
            });
        }
        self.commands.write().push(command);
        Ok(())
    }
}

#[async_trait]
impl UiSurface for RecordingSurface {
    async fn save_panel(&self, panel_id: &str, layout: &PanelLayout) -> Result<()> {
        self.record(
            "Panel.Save",
            UiCommand::SavePanel {
                panel_id: panel_id.to_string(),
                layout: layout.clone(),
            },
        )?;
        self.panels
            .write()
            .insert(panel_id.to_string(), layout.clone());
        if let Some(order) = layout.order {
            self.orders.write().insert(panel_id.to_string(), order);
        }
        Ok(())
    }

    async fn panel_order(&self, panel_id: &str) -> Result<Option<u32>> {
        Ok(self.orders.read().get(panel_id).copied())
    }

    async fn open_panel(&self, panel_id: &str) -> Result<()> {
        self.record(
            "Panel.Open",
            UiCommand::OpenPanel {
                panel_id: panel_id.to_string(),
            },
        )
    }

    async fn set_widget_value(&self, widget_id: &str, value: &str) -> Result<()> {
        self.record(
            "Widget.SetValue",
            UiCommand::SetWidgetValue {
                widget_id: widget_id.to_string(),
                value: value.to_string(),
            },
        )?;
        self.widget_values
            .write()
            .insert(widget_id.to_string(), value.to_string());
        Ok(())
    }

    async fn unset_widget_value(&self, widget_id: &str) -> Result<()> {
        self.record(
            "Widget.UnSetValue",
            UiCommand::UnsetWidgetValue {
                widget_id: widget_id.to_string(),
            },
        )?;
        self.widget_values.write().remove(widget_id);
        Ok(())
    }

    async fn display_prompt(&self, prompt: &Prompt) -> Result<()> {
        self.record("Message.Prompt.Display", UiCommand::Prompt(prompt.clone()))
    }

    async fn display_text_input(&self, input: &TextInput) -> Result<()> {
        self.record(
            "Message.TextInput.Display",
            UiCommand::TextInput(input.clone()),
        )
    }

    async fn display_alert(&self, alert: &Alert) -> Result<()> {
        self.record("Message.Alert.Display", UiCommand::Alert(alert.clone()))
    }
}
