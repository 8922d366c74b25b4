//! ModeStore - typed access to the kiosk mode and kiosk URL settings

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ConfigBackend, SettingChange, SettingKey};
use crate::error::{KioskError, Result};

/// Kiosk mode as stored by the device ("On" / "Off")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KioskMode {
    #[serde(rename = "On")]
    Enabled,
    #[serde(rename = "Off")]
    Disabled,
}

impl KioskMode {
    pub fn as_setting(&self) -> &'static str {
        match self {
            Self::Enabled => "On",
            Self::Disabled => "Off",
        }
    }

    pub fn from_setting(value: &str) -> Option<Self> {
        match value.trim() {
            "On" => Some(Self::Enabled),
            "Off" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Enabled => Self::Disabled,
            Self::Disabled => Self::Enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl fmt::Display for KioskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_setting())
    }
}

/// A change to one of the kiosk settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Mode(KioskMode),
    Url(String),
    /// Notifications were dropped or unreadable; state must be re-read
    Resync,
}

/// Adapter over the two kiosk settings
///
/// Cheap to clone; all clones share the backend.
#[derive(Clone)]
pub struct ModeStore {
    backend: Arc<dyn ConfigBackend>,
}

impl ModeStore {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }

    pub async fn get_mode(&self) -> Result<KioskMode> {
        let raw = self.backend.get(SettingKey::KioskMode).await?;
        KioskMode::from_setting(&raw).ok_or_else(|| KioskError::InvalidSettingValue {
            setting: SettingKey::KioskMode.to_string(),
            value: raw,
        })
    }

    pub async fn set_mode(&self, mode: KioskMode) -> Result<()> {
        debug!(mode = %mode, "Requesting kiosk mode");
        self.backend
            .set(SettingKey::KioskMode, mode.as_setting())
            .await
    }

    pub async fn get_url(&self) -> Result<String> {
        self.backend.get(SettingKey::KioskUrl).await
    }

    pub async fn set_url(&self, url: &str) -> Result<()> {
        debug!(url, "Requesting kiosk URL");
        self.backend.set(SettingKey::KioskUrl, url).await
    }

    /// Stream of kiosk-setting changes
    pub fn watch(&self) -> ModeWatch {
        ModeWatch {
            rx: self.backend.subscribe(),
        }
    }

    /// Run `handler` for every applied kiosk mode change
    ///
    /// On `Resync` the handler gets the mode re-read from the store.
    pub fn on_mode_changed<F, Fut>(&self, handler: F) -> JoinHandle<()>
    where
        F: Fn(KioskMode) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut watch = self.watch();
        let store = self.clone();
        tokio::spawn(async move {
            while let Some(change) = watch.changed().await {
                let mode = match change {
                    StoreChange::Mode(mode) => mode,
                    StoreChange::Resync => match store.get_mode().await {
                        Ok(mode) => mode,
                        Err(e) => {
                            warn!(error = %e, "Mode re-read after resync failed");
                            continue;
                        }
                    },
                    StoreChange::Url(_) => continue,
                };
                handler(mode).await;
            }
        })
    }

    /// Run `handler` for every applied kiosk URL change
    ///
    /// On `Resync` the handler gets the URL re-read from the store.
    pub fn on_url_changed<F, Fut>(&self, handler: F) -> JoinHandle<()>
    where
        F: Fn(String) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut watch = self.watch();
        let store = self.clone();
        tokio::spawn(async move {
            while let Some(change) = watch.changed().await {
                let url = match change {
                    StoreChange::Url(url) => url,
                    StoreChange::Resync => match store.get_url().await {
                        Ok(url) => url,
                        Err(e) => {
                            warn!(error = %e, "URL re-read after resync failed");
                            continue;
                        }
                    },
                    StoreChange::Mode(_) => continue,
                };
                handler(url).await;
            }
        })
    }
}

impl fmt::Debug for ModeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeStore").finish_non_exhaustive()
    }
}

/// Receiver of kiosk-setting changes
pub struct ModeWatch {
    rx: broadcast::Receiver<SettingChange>,
}

impl ModeWatch {
    /// Next kiosk change, or `None` once the backend is gone
    pub async fn changed(&mut self) -> Option<StoreChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.key == SettingKey::KioskMode => {
                    return Some(match KioskMode::from_setting(&change.value) {
                        Some(mode) => StoreChange::Mode(mode),
                        None => {
                            warn!(value = %change.value, "Unrecognized kiosk mode value");
                            StoreChange::Resync
                        }
                    });
                }
                Ok(change) if change.key == SettingKey::KioskUrl => {
                    return Some(StoreChange::Url(change.value));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => {
                    warn!("Mode store watcher lagged behind by {} changes", n);
                    return Some(StoreChange::Resync);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
