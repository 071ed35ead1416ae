//! Installed resources as reported by the resource-group provider.

use serde::{Deserialize, Serialize};

use crate::record::ConfigurationRecord;

/// Resource type of configuration resources.
pub const TYPE_CONFIG: &str = "config";

/// Resource type of raw property files before transformation.
pub const TYPE_PROPERTIES: &str = "properties";

/// Entity id under which a configuration resource is installed.
pub fn config_entity_id(pid: &str) -> String {
    format!("{TYPE_CONFIG}:{pid}")
}

/// One contributing resource inside an installed group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstalledResource {
    pub entity_id: String,
    pub scheme: String,
    pub dictionary: Option<ConfigurationRecord>,
    pub priority: i32,
}

/// All resources installed for one entity, highest priority first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub alias: Option<String>,
    pub resource_type: String,
    pub resources: Vec<InstalledResource>,
}

/// Read-only view of the installed resource groups.
pub trait ResourceGroupProvider: Send + Sync {
    /// Installed groups in provider order.
    fn installed_groups(&self) -> Vec<ResourceGroup>;
}

/// A fixed list of groups, for tests and offline tooling.
#[derive(Clone, Debug, Default)]
pub struct StaticResourceGroups {
    groups: Vec<ResourceGroup>,
}

impl StaticResourceGroups {
    pub fn new(groups: Vec<ResourceGroup>) -> Self {
        Self { groups }
    }
}

impl ResourceGroupProvider for StaticResourceGroups {
    fn installed_groups(&self) -> Vec<ResourceGroup> {
        self.groups.clone()
    }
}
