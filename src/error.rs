// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Kiosk Controller Error Types with Error Codes
//!
//! Error code ranges:
//! - KIOSK-000-009: Configuration errors
//! - KIOSK-010-019: Mode store errors
//! - KIOSK-020-029: Transition errors
//! - KIOSK-030-039: Inbound event errors
//! - KIOSK-040-049: UI command errors
//! - KIOSK-090-099: IO/serialization errors
//!
//! Nothing here is fatal to the process: the event router is the root of its
//! own loop and logs every error it receives before moving on.

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KioskError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug, Diagnostic)]
pub enum KioskError {
    // ═══════════════════════════════════════════
    // CONFIGURATION ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[KIOSK-001] Configuration error: {reason}")]
    #[diagnostic(code(kiosk::config_error), help("Check the YAML structure of the config file"))]
    ConfigError { reason: String },

    #[error("[KIOSK-002] Config file not found: {path}")]
    #[diagnostic(code(kiosk::config_not_found), help("Check the file path exists"))]
    ConfigNotFound { path: String },

    #[error("[KIOSK-003] Destinations '{first}' and '{second}' resolve to the same URL")]
    #[diagnostic(code(kiosk::duplicate_destination))]
    DuplicateDestination { first: String, second: String },

    #[error("[KIOSK-004] Invalid URL for destination '{label}': {reason}")]
    #[diagnostic(code(kiosk::invalid_destination_url))]
    InvalidDestinationUrl { label: String, reason: String },

    #[error("[KIOSK-005] No destinations configured")]
    #[diagnostic(code(kiosk::empty_registry))]
    EmptyRegistry,

    #[error("[KIOSK-006] Invalid PIN: {reason}")]
    #[diagnostic(code(kiosk::invalid_pin))]
    InvalidPin { reason: String },

    #[error("[KIOSK-007] Invalid panel id '{panel_id}'")]
    #[diagnostic(code(kiosk::invalid_panel_id))]
    InvalidPanelId { panel_id: String },

    // ═══════════════════════════════════════════
    // STORE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[KIOSK-010] Setting '{setting}' unavailable: {reason}")]
    #[diagnostic(code(kiosk::store_unavailable))]
    StoreUnavailable { setting: String, reason: String },

    #[error("[KIOSK-011] Setting '{setting}' holds unexpected value '{value}'")]
    #[diagnostic(code(kiosk::invalid_setting_value))]
    InvalidSettingValue { setting: String, value: String },

    // ═══════════════════════════════════════════
    // TRANSITION ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[KIOSK-020] Destination index {index} out of range (registry has {len})")]
    #[diagnostic(code(kiosk::invalid_selection))]
    InvalidSelection { index: usize, len: usize },

    #[error("[KIOSK-021] No pending {kind} confirmation matches the response")]
    #[diagnostic(code(kiosk::confirmation_mismatch))]
    ConfirmationMismatch { kind: String },

    // ═══════════════════════════════════════════
    // EVENT ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[KIOSK-030] Malformed event: {reason}")]
    #[diagnostic(code(kiosk::malformed_event))]
    MalformedEvent { reason: String },

    #[error("[KIOSK-031] Event '{id}' does not belong to this controller")]
    #[diagnostic(code(kiosk::foreign_event))]
    ForeignEvent { id: String },

    // ═══════════════════════════════════════════
    // UI ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[KIOSK-040] UI command '{command}' failed: {reason}")]
    #[diagnostic(code(kiosk::ui_command_failed))]
    UiCommandFailed { command: String, reason: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION (090-099)
    // ═══════════════════════════════════════════
    #[error("[KIOSK-090] IO error: {0}")]
    #[diagnostic(code(kiosk::io_error))]
    Io(#[from] std::io::Error),

    #[error("[KIOSK-091] YAML error: {0}")]
    #[diagnostic(code(kiosk::yaml_error))]
    Yaml(#[from] serde_yaml::Error),

    #[error("[KIOSK-092] JSON error: {0}")]
    #[diagnostic(code(kiosk::json_error))]
    Json(#[from] serde_json::Error),
}

impl KioskError {
    /// Get the error code (e.g., "KIOSK-020")
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } => "KIOSK-001",
            Self::ConfigNotFound { .. } => "KIOSK-002",
            Self::DuplicateDestination { .. } => "KIOSK-003",
            Self::InvalidDestinationUrl { .. } => "KIOSK-004",
            Self::EmptyRegistry => "KIOSK-005",
            Self::InvalidPin { .. } => "KIOSK-006",
            Self::InvalidPanelId { .. } => "KIOSK-007",
            Self::StoreUnavailable { .. } => "KIOSK-010",
            Self::InvalidSettingValue { .. } => "KIOSK-011",
            Self::InvalidSelection { .. } => "KIOSK-020",
            Self::ConfirmationMismatch { .. } => "KIOSK-021",
            Self::MalformedEvent { .. } => "KIOSK-030",
            Self::ForeignEvent { .. } => "KIOSK-031",
            Self::UiCommandFailed { .. } => "KIOSK-040",
            Self::Io(_) => "KIOSK-090",
            Self::Yaml(_) => "KIOSK-091",
            Self::Json(_) => "KIOSK-092",
        }
    }

    /// Errors that only mean "someone else's traffic" and are dropped quietly
    pub fn is_ignorable(&self) -> bool {
        matches!(
            self,
            Self::ForeignEvent { .. }
                | Self::MalformedEvent { .. }
                | Self::ConfirmationMismatch { .. }
        )
    }
}

impl FixSuggestion for KioskError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            KioskError::ConfigError { .. } => Some("Check YAML syntax: indentation and quoting"),
            KioskError::ConfigNotFound { .. } => {
                Some("Pass the config path explicitly or create ~/.config/kiosk-controls/config.yaml")
            }
            KioskError::DuplicateDestination { .. } => {
                Some("Give every destination a distinct URL")
            }
            KioskError::InvalidDestinationUrl { .. } => {
                Some("Use an absolute http:// or https:// URL")
            }
            KioskError::EmptyRegistry => Some("Add at least one entry under destinations:"),
            KioskError::InvalidPin { .. } => Some("Use a PIN of 4 to 12 digits"),
            KioskError::InvalidPanelId { .. } => {
                Some("Use letters, digits and underscores only (no '-')")
            }
            KioskError::StoreUnavailable { .. } => {
                Some("Check the device configuration service is reachable")
            }
            KioskError::InvalidSettingValue { .. } => Some("Kiosk mode must be 'On' or 'Off'"),
            KioskError::InvalidSelection { .. } => {
                Some("Select a destination listed on the panel")
            }
            KioskError::ConfirmationMismatch { .. } => None,
            KioskError::MalformedEvent { .. } => None,
            KioskError::ForeignEvent { .. } => None,
            KioskError::UiCommandFailed { .. } => Some("Check the panel layout is accepted by the device"),
            KioskError::Io(_) => Some("Check file path and permissions"),
            KioskError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
            KioskError::Json(_) => Some("Each script line must be a single JSON event"),
        }
    }
}
