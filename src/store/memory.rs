//! MemoryBackend - in-process configuration service
//!
//! Behaves like the device service from the controller's point of view:
//! writes are applied, then broadcast to subscribers in apply order.
//! Used by the tests and by the `simulate` command.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;

use super::{ConfigBackend, SettingChange, SettingKey};
use crate::error::{KioskError, Result};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Thread-safe in-memory settings with change broadcast
pub struct MemoryBackend {
    values: RwLock<FxHashMap<SettingKey, String>>,
    writes: RwLock<Vec<SettingChange>>,
    offline: AtomicBool,
    tx: broadcast::Sender<SettingChange>,
}

impl MemoryBackend {
    /// Kiosk mode Off, empty kiosk URL
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let mut values = FxHashMap::default();
        values.insert(SettingKey::KioskMode, "Off".to_string());
        values.insert(SettingKey::KioskUrl, String::new());

        Self {
            values: RwLock::new(values),
            writes: RwLock::new(Vec::new()),
            offline: AtomicBool::new(false),
            tx,
        }
    }

    /// Start with the given kiosk mode and URL
    pub fn with_kiosk(mode: &str, url: &str) -> Self {
        let backend = Self::new();
        {
            let mut values = backend.values.write();
            values.insert(SettingKey::KioskMode, mode.to_string());
            values.insert(SettingKey::KioskUrl, url.to_string());
        }
        backend
    }

    /// Simulate the service becoming unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Apply a change made by another agent (not recorded in `writes`)
    pub fn external_set(&self, key: SettingKey, value: &str) {
        self.apply(key, value);
    }

    /// Current value without going through the async trait
    pub fn value(&self, key: SettingKey) -> Option<String> {
        self.values.read().get(&key).cloned()
    }

    /// Every write requested through `ConfigBackend::set`, in order
    pub fn writes(&self) -> Vec<SettingChange> {
        self.writes.read().clone()
    }

    /// Writes to one key
    pub fn writes_to(&self, key: SettingKey) -> Vec<String> {
        self.writes
            .read()
            .iter()
            .filter(|w| w.key == key)
            .map(|w| w.value.clone())
            .collect()
    }

    fn apply(&self, key: SettingKey, value: &str) {
        let mut values = self.values.write();
        values.insert(key, value.to_string());
        // Broadcast under the write lock so notifications follow apply order.
        // No subscribers is fine.
        let _ = self.tx.send(SettingChange {
            key,
            value: value.to_string(),
        });
    }

    fn check_online(&self, key: SettingKey) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(KioskError::StoreUnavailable {
                setting: key.to_string(),
                reason: "configuration service offline".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("values", &*self.values.read())
            .field("offline", &self.offline.load(Ordering::SeqCst))
            .finish()
    }
}

#[async_trait]
impl ConfigBackend for MemoryBackend {
    async fn get(&self, key: SettingKey) -> Result<String> {
        self.check_online(key)?;
        Ok(self.value(key).unwrap_or_default())
    }

    async fn set(&self, key: SettingKey, value: &str) -> Result<()> {
        self.check_online(key)?;
        self.writes.write().push(SettingChange {
            key,
            value: value.to_string(),
        });
        self.apply(key, value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingChange> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get(SettingKey::KioskMode).await.unwrap(), "Off");
        assert_eq!(backend.get(SettingKey::KioskUrl).await.unwrap(), "");
        assert_eq!(backend.get(SettingKey::WebGl).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_set_records_and_broadcasts() {
        let backend = MemoryBackend::new();
        let mut rx = backend.subscribe();

        backend.set(SettingKey::KioskMode, "On").await.unwrap();

        assert_eq!(backend.writes_to(SettingKey::KioskMode), vec!["On"]);
        let change = rx.recv().await.unwrap();
        assert_eq!(change.key, SettingKey::KioskMode);
        assert_eq!(change.value, "On");
    }

    #[tokio::test]
    async fn test_external_set_not_recorded() {
        let backend = MemoryBackend::new();
        backend.external_set(SettingKey::KioskUrl, "https://a.example");
        assert!(backend.writes().is_empty());
        assert_eq!(
            backend.value(SettingKey::KioskUrl).as_deref(),
            Some("https://a.example")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_broadcast_in_apply_order() {
        let backend = std::sync::Arc::new(MemoryBackend::new());
        let mut rx = backend.subscribe();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let backend = backend.clone();
                tokio::spawn(async move {
                    backend
                        .set(SettingKey::KioskUrl, &format!("https://{}.example", i))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut last = None;
        while let Ok(change) = rx.try_recv() {
            last = Some(change.value);
        }
        assert_eq!(last, backend.value(SettingKey::KioskUrl));
    }

    #[tokio::test]
    async fn test_offline_rejects_and_keeps_value() {
        let backend = MemoryBackend::with_kiosk("On", "https://a.example");
        backend.set_offline(true);

        assert!(backend.get(SettingKey::KioskMode).await.is_err());
        assert!(backend.set(SettingKey::KioskMode, "Off").await.is_err());

        backend.set_offline(false);
        assert_eq!(backend.get(SettingKey::KioskMode).await.unwrap(), "On");
        assert!(backend.writes().is_empty());
    }
}
