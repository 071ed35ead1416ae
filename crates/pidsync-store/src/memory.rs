use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, RwLock};

use tracing::debug;

use pidsync_types::{codec, ConfigurationRecord, SERVICE_FACTORY_PID, SERVICE_PID};

use crate::configuration::StoredConfiguration;
use crate::error::{StoreError, StoreResult};
use crate::event::ConfigurationEvent;
use crate::filter::Filter;
use crate::traits::ConfigurationStore;

/// In-memory configuration store.
///
/// Intended for tests and embedding. Records are kept in a `BTreeMap` behind
/// a `RwLock`, so listings come back in PID order. Change notifications are
/// queued on subscriber channels after each mutation and never delivered
/// synchronously into the mutating caller.
pub struct InMemoryConfigurationStore {
    configs: RwLock<BTreeMap<String, StoredConfiguration>>,
    subscribers: Mutex<Vec<Sender<ConfigurationEvent>>>,
    available: AtomicBool,
}

impl InMemoryConfigurationStore {
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Receive every change notification published from now on.
    pub fn subscribe(&self) -> Receiver<ConfigurationEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Insert a record as-is, without publishing a notification.
    ///
    /// Used to stage pre-existing (for example legacy) records.
    pub fn seed(&self, config: StoredConfiguration) -> StoreResult<()> {
        self.write_map()?.insert(config.pid.clone(), config);
        Ok(())
    }

    /// Toggle availability; while unavailable every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.configs.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All PIDs currently stored, sorted.
    pub fn pids(&self) -> Vec<String> {
        self.configs
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store switched off".into()))
        }
    }

    fn read_map(
        &self,
    ) -> StoreResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, StoredConfiguration>>> {
        self.configs
            .read()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    fn write_map(
        &self,
    ) -> StoreResult<std::sync::RwLockWriteGuard<'_, BTreeMap<String, StoredConfiguration>>> {
        self.configs
            .write()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    fn publish(&self, event: ConfigurationEvent) {
        debug!(kind = %event.kind, pid = %event.pid, "configuration event");
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

impl Default for InMemoryConfigurationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationStore for InMemoryConfigurationStore {
    fn get(&self, pid: &str) -> StoreResult<Option<StoredConfiguration>> {
        self.check_available()?;
        Ok(self.read_map()?.get(pid).cloned())
    }

    fn list(&self, filter: &str) -> StoreResult<Vec<StoredConfiguration>> {
        self.check_available()?;
        let filter = Filter::parse(filter)?;
        Ok(self
            .read_map()?
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    fn get_or_create(
        &self,
        factory_pid: Option<&str>,
        name: &str,
        location: Option<&str>,
    ) -> StoreResult<StoredConfiguration> {
        self.check_available()?;
        let pid = codec::encode(factory_pid, name);
        let mut map = self.write_map()?;
        let config = map.entry(pid.clone()).or_insert_with(|| StoredConfiguration {
            pid,
            factory_pid: factory_pid.map(str::to_string),
            properties: None,
            bundle_location: location.map(str::to_string),
        });
        Ok(config.clone())
    }

    fn update(&self, pid: &str, properties: &ConfigurationRecord) -> StoreResult<()> {
        self.check_available()?;
        let factory_pid = {
            let mut map = self.write_map()?;
            let config = map
                .get_mut(pid)
                .ok_or_else(|| StoreError::NotFound(pid.to_string()))?;
            let mut stored = properties.clone();
            stored.insert(SERVICE_PID, pid);
            if let Some(factory_pid) = &config.factory_pid {
                stored.insert(SERVICE_FACTORY_PID, factory_pid.as_str());
            }
            config.properties = Some(stored);
            config.factory_pid.clone()
        };
        self.publish(ConfigurationEvent::updated(pid, factory_pid));
        Ok(())
    }

    fn delete(&self, pid: &str) -> StoreResult<bool> {
        self.check_available()?;
        let removed = self.write_map()?.remove(pid);
        match removed {
            Some(config) => {
                self.publish(ConfigurationEvent::deleted(pid, config.factory_pid));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_bundle_location(&self, pid: &str, location: Option<&str>) -> StoreResult<()> {
        self.check_available()?;
        let mut map = self.write_map()?;
        let config = map
            .get_mut(pid)
            .ok_or_else(|| StoreError::NotFound(pid.to_string()))?;
        config.bundle_location = location.map(str::to_string);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryConfigurationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryConfigurationStore")
            .field("config_count", &self.len())
            .finish()
    }
}
