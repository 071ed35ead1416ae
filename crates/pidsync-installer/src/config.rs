use std::collections::BTreeMap;
use std::path::Path;

use pidsync_merge::MergeSchemes;
use pidsync_types::{ExtensionMode, PropertyValue};
use serde::{Deserialize, Serialize};

use crate::error::{InstallerError, InstallerResult};

/// Framework property enabling multi-location bundle binding.
pub const USE_MULTI_LOCATION_PROPERTY: &str = "pidsync.config.useMulti";

/// Framework property listing the merge schemes, comma separated.
pub const MERGE_SCHEMES_PROPERTY: &str = "pidsync.config.mergeSchemes";

/// Bundle location that binds a record to any bundle.
pub const MULTI_LOCATION: &str = "?";

/// Configuration of the installer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Location used when a resource names none.
    pub default_location: Option<String>,
    /// Schemes whose resources contribute inherited properties. `None`
    /// disables merging and default-property pruning.
    pub merge_schemes: Option<MergeSchemes>,
    /// Recognize the legacy set of record-file extensions.
    pub legacy_extensions: bool,
}

impl InstallerConfig {
    pub fn from_toml_str(s: &str) -> InstallerResult<Self> {
        toml::from_str(s).map_err(|e| InstallerError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> InstallerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Build from flat framework properties.
    ///
    /// `pidsync.config.useMulti` (case-insensitive `true`) sets the default
    /// location to [`MULTI_LOCATION`]; `pidsync.config.mergeSchemes` is a
    /// comma-separated scheme list.
    pub fn from_properties(properties: &BTreeMap<String, String>) -> InstallerResult<Self> {
        let mut config = Self::default();
        let use_multi = properties
            .get(USE_MULTI_LOCATION_PROPERTY)
            .map(|v| PropertyValue::from(v.as_str()));
        if PropertyValue::to_boolean(use_multi.as_ref(), false) {
            config = config.with_multi_location();
        }
        if let Some(list) = properties.get(MERGE_SCHEMES_PROPERTY) {
            config.merge_schemes = Some(MergeSchemes::parse(list)?);
        }
        Ok(config)
    }

    pub fn with_multi_location(mut self) -> Self {
        self.default_location = Some(MULTI_LOCATION.to_string());
        self
    }

    pub fn with_merge_schemes(mut self, schemes: MergeSchemes) -> Self {
        self.merge_schemes = Some(schemes);
        self
    }

    pub fn extension_mode(&self) -> ExtensionMode {
        if self.legacy_extensions {
            ExtensionMode::Legacy
        } else {
            ExtensionMode::Standard
        }
    }
}
