use pidsync_types::{codec, ConfigurationRecord, ALIAS_KEY, SERVICE_FACTORY_PID, SERVICE_PID};

use crate::configuration::StoredConfiguration;
use crate::error::StoreResult;
use crate::filter::Filter;

/// Persistent configuration store addressed by PID and factory PID.
///
/// The store is opaque to pidsync: it is only read through filters and
/// mutated through the operations below. Every mutation is expected to be
/// followed, asynchronously, by a change notification.
pub trait ConfigurationStore: Send + Sync {
    /// Read a configuration by its exact PID.
    ///
    /// Returns `Ok(None)` if it does not exist.
    fn get(&self, pid: &str) -> StoreResult<Option<StoredConfiguration>>;

    /// List configurations matching a filter in the syntax of [`Filter`].
    fn list(&self, filter: &str) -> StoreResult<Vec<StoredConfiguration>>;

    /// Return the configuration for `(factory_pid, name)`, creating an empty
    /// one bound to `location` if it does not exist yet.
    fn get_or_create(
        &self,
        factory_pid: Option<&str>,
        name: &str,
        location: Option<&str>,
    ) -> StoreResult<StoredConfiguration>;

    /// Replace the properties of an existing configuration.
    fn update(&self, pid: &str, properties: &ConfigurationRecord) -> StoreResult<()>;

    /// Delete a configuration. Returns `true` if it existed.
    fn delete(&self, pid: &str) -> StoreResult<bool>;

    /// Change the bundle-location binding of an existing configuration.
    fn set_bundle_location(&self, pid: &str, location: Option<&str>) -> StoreResult<()>;

    /// First configuration matching `filter`.
    fn first(&self, filter: &Filter) -> StoreResult<Option<StoredConfiguration>> {
        Ok(self.list(&filter.to_string())?.into_iter().next())
    }

    /// Exact lookup of the canonical record for `(factory_pid, name)`.
    fn lookup(
        &self,
        factory_pid: Option<&str>,
        name: &str,
    ) -> StoreResult<Option<StoredConfiguration>> {
        match factory_pid {
            None => self.first(&Filter::eq(SERVICE_PID, name)),
            Some(factory_pid) => self.first(
                &Filter::eq(SERVICE_FACTORY_PID, factory_pid)
                    .and(SERVICE_PID, codec::encode(Some(factory_pid), name)),
            ),
        }
    }

    /// Canonical record for `(factory_pid, name)`, falling back to a legacy
    /// factory record when no canonical one exists.
    fn find_configuration(
        &self,
        factory_pid: Option<&str>,
        name: &str,
    ) -> StoreResult<Option<StoredConfiguration>> {
        match (self.lookup(factory_pid, name)?, factory_pid) {
            (Some(config), _) => Ok(Some(config)),
            (None, Some(factory_pid)) => self.legacy_factory_configuration(factory_pid, None, name),
            (None, None) => Ok(None),
        }
    }

    /// Locate a factory record written in a legacy PID layout.
    ///
    /// The legacy PID is `alias` without its `factory_pid.` prefix when an
    /// alias is given, otherwise `name`. Tried in order: that PID exactly,
    /// `factory_pid.` + that PID, and finally the deprecated alias marker.
    fn legacy_factory_configuration(
        &self,
        factory_pid: &str,
        alias: Option<&str>,
        name: &str,
    ) -> StoreResult<Option<StoredConfiguration>> {
        let config_pid = alias
            .and_then(|alias| alias.get(factory_pid.len() + 1..))
            .unwrap_or(name);

        let by_pid = Filter::eq(SERVICE_FACTORY_PID, factory_pid).and(SERVICE_PID, config_pid);
        if let Some(config) = self.first(&by_pid)? {
            return Ok(Some(config));
        }

        let dotted = Filter::eq(SERVICE_FACTORY_PID, factory_pid)
            .and(SERVICE_PID, format!("{factory_pid}.{config_pid}"));
        if let Some(config) = self.first(&dotted)? {
            return Ok(Some(config));
        }

        self.first(&Filter::eq(SERVICE_FACTORY_PID, factory_pid).and(ALIAS_KEY, config_pid))
    }
}
