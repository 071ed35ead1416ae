//! Configuration records and the administrative keys they may carry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;

/// Store-assigned persistent identifier.
pub const SERVICE_PID: &str = "service.pid";

/// Marker naming the factory PID of a factory configuration.
pub const SERVICE_FACTORY_PID: &str = "service.factoryPid";

/// Legacy marker recording the path a configuration was installed from.
pub const CONFIG_PATH_KEY: &str = "pidsync.installer.osgi.path";

/// Legacy marker recording the alias of a factory configuration.
pub const ALIAS_KEY: &str = "pidsync.installer.osgi.factoryaliaspid";

/// Resource property naming the bundle-location hint for the record.
pub const PROPERTY_BUNDLE_LOCATION: &str = "pidsync.installer.configuration.bundlelocation";

/// Resource property controlling whether external edits are persisted back.
pub const PROPERTY_PERSISTENCE: &str = "pidsync.installer.configuration.persist";

/// Keys excluded from every equivalence and merge computation.
pub const ADMINISTRATIVE_KEYS: [&str; 4] = [SERVICE_PID, CONFIG_PATH_KEY, ALIAS_KEY, SERVICE_FACTORY_PID];

/// Returns `true` if `key` is one of the [`ADMINISTRATIVE_KEYS`].
pub fn is_administrative_key(key: &str) -> bool {
    ADMINISTRATIVE_KEYS.contains(&key)
}

/// A configuration dictionary: property key to value, iterated in key order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationRecord {
    properties: BTreeMap<String, PropertyValue>,
}

impl ConfigurationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Insert a property, returning the previous value for `key`.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        self.properties.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(key, value);
        self
    }
}

impl<K: Into<String>> FromIterator<(K, PropertyValue)> for ConfigurationRecord {
    fn from_iter<I: IntoIterator<Item = (K, PropertyValue)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for ConfigurationRecord {
    type Item = (String, PropertyValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigurationRecord {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}
