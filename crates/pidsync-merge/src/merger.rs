//! Default properties inherited from merge-scheme resources.

use std::fmt;
use std::sync::Arc;

use pidsync_diff::{clean_configuration, remove_redundant_properties};
use pidsync_types::{config_entity_id, ConfigurationRecord, ResourceGroupProvider};
use tracing::debug;

use crate::merge::merge_reverse_order;
use crate::schemes::MergeSchemes;

/// Computes the properties a record inherits from merge-scheme resources.
///
/// Without merge schemes every operation is a no-op.
#[derive(Clone)]
pub struct ConfigurationMerger {
    schemes: Option<MergeSchemes>,
    provider: Arc<dyn ResourceGroupProvider>,
}

impl ConfigurationMerger {
    pub fn new(schemes: Option<MergeSchemes>, provider: Arc<dyn ResourceGroupProvider>) -> Self {
        Self { schemes, provider }
    }

    pub fn schemes(&self) -> Option<&MergeSchemes> {
        self.schemes.as_ref()
    }

    /// Merged dictionaries of the merge-scheme resources installed for `pid`.
    ///
    /// Only the first installed group holding the `config:<pid>` entity is
    /// consulted, and only its resources for that entity. Returns `None` without merge schemes, when no group holds
    /// the entity, or when none of its resources is eligible.
    pub fn get_default_properties(&self, pid: &str) -> Option<ConfigurationRecord> {
        let schemes = self.schemes.as_ref()?;
        let entity_id = config_entity_id(pid);

        let group = self
            .provider
            .installed_groups()
            .into_iter()
            .find(|group| group.resources.iter().any(|r| r.entity_id == entity_id))?;

        let contributions: Vec<ConfigurationRecord> = group
            .resources
            .iter()
            .filter(|r| r.entity_id == entity_id && schemes.contains(&r.scheme))
            .filter_map(|r| r.dictionary.as_ref())
            .map(clean_configuration)
            .collect();

        if contributions.is_empty() {
            return None;
        }

        debug!(pid = %pid, group = %group.id, contributions = contributions.len(), "default properties found");
        Some(merge_reverse_order(&contributions))
    }

    /// Strip from `record` every property it holds unchanged from its defaults.
    pub fn remove_default_properties(&self, pid: &str, record: &mut ConfigurationRecord) {
        if let Some(defaults) = self.get_default_properties(pid) {
            remove_redundant_properties(record, &defaults);
        }
    }
}

impl fmt::Debug for ConfigurationMerger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationMerger")
            .field("schemes", &self.schemes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pidsync_types::{InstalledResource, ResourceGroup, StaticResourceGroups, TYPE_CONFIG};

    fn resource(pid: &str, scheme: &str, dictionary: ConfigurationRecord) -> InstalledResource {
        InstalledResource {
            entity_id: config_entity_id(pid),
            scheme: scheme.into(),
            dictionary: Some(dictionary),
            priority: 0,
        }
    }

    fn group(id: &str, resources: Vec<InstalledResource>) -> ResourceGroup {
        ResourceGroup {
            id: id.into(),
            alias: None,
            resource_type: TYPE_CONFIG.into(),
            resources,
        }
    }

    fn merger(schemes: Option<&str>, groups: Vec<ResourceGroup>) -> ConfigurationMerger {
        ConfigurationMerger::new(
            schemes.map(|s| MergeSchemes::parse(s).unwrap()),
            Arc::new(StaticResourceGroups::new(groups)),
        )
    }

    #[test]
    fn no_schemes_no_defaults() {
        let groups = vec![group("p", vec![resource("p", "default", ConfigurationRecord::new().with("a", 1))])];
        assert_eq!(merger(None, groups).get_default_properties("p"), None);
    }

    #[test]
    fn defaults_merge_eligible_resources() {
        let groups = vec![group(
            "p",
            vec![
                resource("p", "default", ConfigurationRecord::new().with("a", 1)),
                resource("p", "other", ConfigurationRecord::new().with("z", 0)),
                resource("p", "base", ConfigurationRecord::new().with("a", 2).with("b", 3)),
            ],
        )];
        let defaults = merger(Some("default,base"), groups).get_default_properties("p").unwrap();
        assert_eq!(defaults, ConfigurationRecord::new().with("a", 1).with("b", 3));
    }

    #[test]
    fn only_first_matching_group_considered() {
        let groups = vec![
            group("p", vec![resource("p", "other", ConfigurationRecord::new().with("a", 1))]),
            group("p-again", vec![resource("p", "default", ConfigurationRecord::new().with("a", 2))]),
        ];
        assert_eq!(merger(Some("default"), groups).get_default_properties("p"), None);
    }

    #[test]
    fn resources_of_other_entities_ignored() {
        let groups = vec![group(
            "p",
            vec![
                resource("p", "default", ConfigurationRecord::new().with("a", 1)),
                resource("q", "default", ConfigurationRecord::new().with("b", 2)),
            ],
        )];
        let defaults = merger(Some("default"), groups).get_default_properties("p").unwrap();
        assert_eq!(defaults, ConfigurationRecord::new().with("a", 1));
    }

    #[test]
    fn unknown_pid_has_no_defaults() {
        let groups = vec![group("q", vec![resource("q", "default", ConfigurationRecord::new().with("a", 1))])];
        assert_eq!(merger(Some("default"), groups).get_default_properties("p"), None);
    }

    #[test]
    fn remove_default_properties_prunes_inherited_values() {
        let groups = vec![group(
            "p",
            vec![resource("p", "default", ConfigurationRecord::new().with("a", 1).with("b", 2))],
        )];
        let mut record = ConfigurationRecord::new().with("a", "1").with("b", 5).with("c", 7);
        merger(Some("default"), groups).remove_default_properties("p", &mut record);
        assert_eq!(record, ConfigurationRecord::new().with("b", 5).with("c", 7));
    }

    #[test]
    fn remove_default_properties_without_schemes_is_noop() {
        let mut record = ConfigurationRecord::new().with("a", 1);
        merger(None, vec![]).remove_default_properties("p", &mut record);
        assert_eq!(record.len(), 1);
    }
}
