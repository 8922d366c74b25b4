//! Device housekeeping and startup policy
//!
//! - `Housekeeping`: clears transient session data between kiosk users
//! - `DevicePolicy`: the non-kiosk settings a kiosk deployment wants
//!   (web engine on, settings menu lock, assistant, ultrasound)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::KioskConfig;
use crate::error::{KioskError, Result};
use crate::store::{ConfigBackend, SettingKey};

const ULTRASOUND_DEFAULT_VOLUME: u8 = 70;

/// Data cleared by a session cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CleanupContent {
    TemporaryAccounts,
    Whiteboards,
    WebData,
}

impl CleanupContent {
    pub fn all() -> Vec<CleanupContent> {
        vec![Self::TemporaryAccounts, Self::Whiteboards, Self::WebData]
    }
}

/// Session cleanup on the device
#[async_trait]
pub trait Housekeeping: Send + Sync {
    async fn run_cleanup(&self, content: &[CleanupContent]) -> Result<()>;
}

/// Records cleanup runs
#[derive(Debug, Default)]
pub struct RecordingHousekeeping {
    runs: RwLock<Vec<Vec<CleanupContent>>>,
    failing: AtomicBool,
}

impl RecordingHousekeeping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<Vec<CleanupContent>> {
        self.runs.read().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Housekeeping for RecordingHousekeeping {
    async fn run_cleanup(&self, content: &[CleanupContent]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(KioskError::UiCommandFailed {
                command: "RoomCleanup.Run".to_string(),
                reason: "cleanup unavailable".to_string(),
            });
        }
        self.runs.write().push(content.to_vec());
        Ok(())
    }
}

/// Device settings applied once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePolicy {
    pub disable_settings_menu: bool,
    pub disable_assistant: bool,
    pub disable_ultrasound: bool,
}

impl DevicePolicy {
    pub fn from_config(config: &KioskConfig) -> Self {
        Self {
            disable_settings_menu: config.disable_settings_menu,
            disable_assistant: config.disable_assistant,
            disable_ultrasound: config.disable_ultrasound,
        }
    }

    /// Setting writes this policy implies, in application order
    pub fn settings(&self) -> Vec<(SettingKey, String)> {
        let menu = if self.disable_settings_menu {
            "Locked"
        } else {
            "Unlocked"
        };
        let assistant = if self.disable_assistant { "Off" } else { "On" };
        let volume = if self.disable_ultrasound {
            0
        } else {
            ULTRASOUND_DEFAULT_VOLUME
        };

        vec![
            (SettingKey::WebEngineMode, "On".to_string()),
            (SettingKey::WebGl, "On".to_string()),
            (SettingKey::SettingsMenuMode, menu.to_string()),
            (SettingKey::AssistantMode, assistant.to_string()),
            (SettingKey::UltrasoundMaxVolume, volume.to_string()),
        ]
    }

    /// Write every setting; failures are logged and skipped.
    ///
    /// Returns how many writes the backend accepted.
    pub async fn apply(&self, backend: &Arc<dyn ConfigBackend>) -> usize {
        let mut applied = 0;
        for (key, value) in self.settings() {
            match backend.set(key, &value).await {
                Ok(()) => {
                    debug!(setting = %key, value = %value, "Applied device policy");
                    applied += 1;
                }
                Err(e) => warn!(setting = %key, "Failed to apply device policy: {}", e),
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn policy(disable: bool) -> DevicePolicy {
        DevicePolicy {
            disable_settings_menu: disable,
            disable_assistant: disable,
            disable_ultrasound: disable,
        }
    }

    #[test]
    fn test_policy_values() {
        let locked = policy(true).settings();
        assert!(locked.contains(&(SettingKey::SettingsMenuMode, "Locked".into())));
        assert!(locked.contains(&(SettingKey::AssistantMode, "Off".into())));
        assert!(locked.contains(&(SettingKey::UltrasoundMaxVolume, "0".into())));

        let open = policy(false).settings();
        assert!(open.contains(&(SettingKey::SettingsMenuMode, "Unlocked".into())));
        assert!(open.contains(&(SettingKey::UltrasoundMaxVolume, "70".into())));
        assert_eq!(open[0], (SettingKey::WebEngineMode, "On".into()));
    }

    #[tokio::test]
    async fn test_apply_writes_backend() {
        let backend = Arc::new(MemoryBackend::new());
        let dyn_backend: Arc<dyn ConfigBackend> = backend.clone();

        assert_eq!(policy(true).apply(&dyn_backend).await, 5);
        assert_eq!(
            backend.value(SettingKey::SettingsMenuMode).as_deref(),
            Some("Locked")
        );
    }

    #[tokio::test]
    async fn test_apply_skips_failures() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_offline(true);
        let dyn_backend: Arc<dyn ConfigBackend> = backend.clone();

        assert_eq!(policy(false).apply(&dyn_backend).await, 0);
    }

    #[tokio::test]
    async fn test_recording_housekeeping() {
        let hk = RecordingHousekeeping::new();
        hk.run_cleanup(&CleanupContent::all()).await.unwrap();
        assert_eq!(hk.runs(), vec![CleanupContent::all()]);

        hk.set_failing(true);
        assert!(hk.run_cleanup(&[CleanupContent::WebData]).await.is_err());
        assert_eq!(hk.runs().len(), 1);
    }
}
