//! Mode Store - the device's configuration service and the kiosk adapter over it
//!
//! Key types:
//! - `ConfigBackend`: Trait for the external settings service (get/set/subscribe)
//! - `SettingKey`: The settings this controller reads or writes
//! - `ModeStore`: Typed adapter over the kiosk mode + kiosk URL settings
//! - `ModeWatch`: Change-notification stream filtered to the kiosk settings
//! - `MemoryBackend`: In-process backend for tests and simulation
//!
//! The backend is the single source of truth. Nothing in this crate caches a
//! value it wrote: every decision re-reads through the backend, and change
//! notifications only come from the backend after it applied a write.

mod adapter;
mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;

pub use adapter::{KioskMode, ModeStore, ModeWatch, StoreChange};
pub use memory::MemoryBackend;

/// Settings known to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingKey {
    KioskMode,
    KioskUrl,
    WebEngineMode,
    WebGl,
    SettingsMenuMode,
    AssistantMode,
    UltrasoundMaxVolume,
}

impl SettingKey {
    /// Configuration path as the device names it
    pub fn path(&self) -> &'static str {
        match self {
            Self::KioskMode => "UserInterface.Kiosk.Mode",
            Self::KioskUrl => "UserInterface.Kiosk.URL",
            Self::WebEngineMode => "WebEngine.Mode",
            Self::WebGl => "WebEngine.Features.WebGL",
            Self::SettingsMenuMode => "UserInterface.SettingsMenu.Mode",
            Self::AssistantMode => "UserInterface.Assistant.Mode",
            Self::UltrasoundMaxVolume => "Audio.Ultrasound.MaxVolume",
        }
    }

    /// Whether a change to this key affects the kiosk projection
    pub fn is_kiosk(&self) -> bool {
        matches!(self, Self::KioskMode | Self::KioskUrl)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Notification that the backend applied a new value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingChange {
    pub key: SettingKey,
    pub value: String,
}

/// External configuration service
///
/// `set` is a request: the caller learns about the applied value through
/// `subscribe`, never by echoing its own write.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Read the current value. Fails with `StoreUnavailable` when unreachable.
    async fn get(&self, key: SettingKey) -> Result<String>;

    /// Request a new value
    async fn set(&self, key: SettingKey, value: &str) -> Result<()>;

    /// Subscribe to applied changes, in the order the service applies them
    fn subscribe(&self) -> broadcast::Receiver<SettingChange>;
}
