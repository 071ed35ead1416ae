//! Derives configuration identities from raw property-file resources.

use pidsync_types::{
    codec, ConfigurationIdentity, ConfigurationRecord, ExtensionMode, SERVICE_FACTORY_PID, SERVICE_PID,
    TYPE_CONFIG, TYPE_PROPERTIES,
};
use serde::{Deserialize, Serialize};

/// A resource as registered with the installer, before transformation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegisteredResource {
    pub url: String,
    pub resource_type: String,
    pub dictionary: Option<ConfigurationRecord>,
}

impl RegisteredResource {
    pub fn properties(url: impl Into<String>, dictionary: Option<ConfigurationRecord>) -> Self {
        Self {
            url: url.into(),
            resource_type: TYPE_PROPERTIES.to_string(),
            dictionary,
        }
    }
}

/// A property resource recognized as a configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformationResult {
    /// Canonical PID.
    pub id: String,
    pub resource_type: String,
    /// `service.pid`, plus `service.factoryPid` for factory configurations.
    pub attributes: ConfigurationRecord,
}

impl TransformationResult {
    pub fn identity(&self) -> ConfigurationIdentity {
        let name = self
            .attributes
            .get(SERVICE_PID)
            .and_then(|v| v.as_str())
            .unwrap_or(&self.id);
        match self.attributes.get(SERVICE_FACTORY_PID).and_then(|v| v.as_str()) {
            Some(factory_pid) => ConfigurationIdentity::factory(factory_pid, name),
            None => ConfigurationIdentity::singleton(name),
        }
    }
}

/// Turn a `properties` resource into a `config` resource.
///
/// The identity comes from the last segment of the resource URL, with a
/// known record extension stripped, split into factory PID and name. Other
/// resource types are left alone.
pub fn transform(resource: &RegisteredResource, mode: ExtensionMode) -> Option<TransformationResult> {
    if resource.resource_type != TYPE_PROPERTIES {
        return None;
    }

    let last_segment = codec::resource_id(&resource.url);
    let pid = codec::remove_config_extension(&last_segment, mode);
    let identity = codec::split_factory_and_name(pid);

    let mut attributes = ConfigurationRecord::new().with(SERVICE_PID, identity.name.as_str());
    if let Some(factory_pid) = &identity.factory_pid {
        attributes.insert(SERVICE_FACTORY_PID, factory_pid.as_str());
    }

    Some(TransformationResult {
        id: identity.canonical(),
        resource_type: TYPE_CONFIG.to_string(),
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singleton_from_path() {
        let r = RegisteredResource::properties("jcrinstall:/apps/x/config/org.example.Service.config", None);
        let result = transform(&r, ExtensionMode::Standard).unwrap();
        assert_eq!(result.id, "org.example.Service");
        assert_eq!(result.resource_type, TYPE_CONFIG);
        assert_eq!(result.identity(), ConfigurationIdentity::singleton("org.example.Service"));
        assert!(!result.attributes.contains_key(SERVICE_FACTORY_PID));
    }

    #[test]
    fn factory_from_tilde_path() {
        let r = RegisteredResource::properties("file:C:\\configs\\org.example.Factory~main.cfg.json", None);
        let result = transform(&r, ExtensionMode::Standard).unwrap();
        assert_eq!(result.id, "org.example.Factory~main");
        assert_eq!(result.identity(), ConfigurationIdentity::factory("org.example.Factory", "main"));
    }

    #[test]
    fn factory_from_legacy_dash_path() {
        let r = RegisteredResource::properties("/install/org.example.Factory-main.cfg", None);
        let result = transform(&r, ExtensionMode::Standard).unwrap();
        assert_eq!(result.id, "org.example.Factory~main");
    }

    #[test]
    fn legacy_extension_mode() {
        let r = RegisteredResource::properties("/install/org.example.Service.xml", None);
        assert_eq!(transform(&r, ExtensionMode::Legacy).unwrap().id, "org.example.Service");
        assert_eq!(
            transform(&r, ExtensionMode::Standard).unwrap().id,
            "org.example.Service.xml"
        );
    }

    #[test]
    fn other_types_untouched() {
        let r = RegisteredResource {
            url: "/install/bundle.jar".into(),
            resource_type: "bundle".into(),
            dictionary: None,
        };
        assert!(transform(&r, ExtensionMode::Standard).is_none());
    }
}
