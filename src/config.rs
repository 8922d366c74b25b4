//! Kiosk Controller Configuration
//!
//! One YAML file describes the panel, the unlock PIN, the exit and
//! standby behavior, and the ordered destination list.
//! Default location: `~/.config/kiosk-controls/config.yaml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`KIOSK_PIN`)
//! 2. Config file
//! 3. Defaults

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::CleanupContent;
use crate::error::{KioskError, Result};
use crate::registry::{Destination, DestinationRegistry};

static PANEL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid panel id regex"));
static PIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4,12}$").expect("valid pin regex"));

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KioskConfig {
    /// Panel and dialog title
    pub name: String,

    /// Prefix of every panel, widget and feedback id
    pub panel_id: String,

    /// PIN that unlocks the panel while kiosk mode is on
    pub pin: Option<String>,

    /// Allow leaving kiosk mode from the device (PIN unlock, sensor, standby)
    pub allow_exit: bool,

    pub disable_settings_menu: bool,
    pub disable_assistant: bool,
    pub disable_ultrasound: bool,

    /// Clear session data right before enabling kiosk mode
    pub cleanup_on_enable: bool,

    pub auto_cleanup_on_standby: bool,
    pub auto_cleanup_on_halfwake: bool,
    pub auto_enable_on_standby: bool,
    pub auto_enable_on_halfwake: bool,

    /// What a cleanup clears
    pub cleanup_content: Vec<CleanupContent>,

    /// Selectable kiosk destinations, in panel order
    #[serde(alias = "kiosk_urls")]
    pub destinations: Vec<Destination>,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            name: "Kiosk Controls".to_string(),
            panel_id: "kioskcontrols".to_string(),
            pin: None,
            allow_exit: true,
            disable_settings_menu: false,
            disable_assistant: true,
            disable_ultrasound: true,
            cleanup_on_enable: false,
            auto_cleanup_on_standby: true,
            auto_cleanup_on_halfwake: false,
            auto_enable_on_standby: true,
            auto_enable_on_halfwake: false,
            cleanup_content: CleanupContent::all(),
            destinations: Vec::new(),
        }
    }
}

impl KioskConfig {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kiosk-controls")
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Parse YAML without validating
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| KioskError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Load, apply env overrides, validate
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(KioskError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?.with_env();
        config.validate()?;
        debug!(
            path = %path.display(),
            destinations = config.destinations.len(),
            "Loaded kiosk config"
        );
        Ok(config)
    }

    /// Merge with environment variables
    pub fn with_env(mut self) -> Self {
        if let Ok(pin) = std::env::var("KIOSK_PIN") {
            if !pin.is_empty() {
                self.pin = Some(pin);
            }
        }
        self
    }

    /// Check every constraint the controller relies on
    pub fn validate(&self) -> Result<()> {
        if !PANEL_ID_RE.is_match(&self.panel_id) {
            return Err(KioskError::InvalidPanelId {
                panel_id: self.panel_id.clone(),
            });
        }

        if let Some(pin) = &self.pin {
            if !PIN_RE.is_match(pin) {
                return Err(KioskError::InvalidPin {
                    reason: "expected 4 to 12 digits".to_string(),
                });
            }
        }

        if self.destinations.is_empty() {
            return Err(KioskError::EmptyRegistry);
        }

        for dest in &self.destinations {
            validate_destination_url(dest)?;
        }

        self.registry().map(|_| ())
    }

    /// Build the destination registry
    pub fn registry(&self) -> Result<DestinationRegistry> {
        DestinationRegistry::new(self.destinations.clone())
    }

    /// Whether the panel can be unlocked with a PIN while kiosk mode is on
    pub fn pin_unlock_enabled(&self) -> bool {
        self.allow_exit && self.pin.is_some()
    }
}

fn validate_destination_url(dest: &Destination) -> Result<()> {
    let invalid = |reason: String| KioskError::InvalidDestinationUrl {
        label: dest.label.clone(),
        reason,
    };

    let parsed = url::Url::parse(dest.url.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("scheme '{}' not allowed", scheme))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(())
}
