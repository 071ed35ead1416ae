//! Turns store change notifications into resource changes.
//!
//! Notifications caused by the installer's own writes are dropped by
//! consuming their ledger entry; everything else is an external edit and is
//! reported upward.

use std::sync::Arc;

use pidsync_diff::clean_configuration;
use pidsync_merge::ConfigurationMerger;
use pidsync_store::{ConfigurationEvent, ConfigurationEventKind, ConfigurationStore};
use pidsync_types::{codec, ConfigurationRecord, PropertyValue, PROPERTY_PERSISTENCE};
use serde::Serialize;
use tracing::debug;

use crate::coordinator::Coordinator;

/// Attributes reported with an external add or update.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceAttributes {
    pub pid: String,
    pub factory_pid: Option<String>,
    pub uri_hint: String,
    /// Bundle location of the record.
    pub installation_hint: Option<String>,
    /// Whether the edit should be persisted back to its source.
    pub persist: bool,
}

/// An external change to a configuration record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ResourceChange {
    AddedOrUpdated {
        id: String,
        dictionary: ConfigurationRecord,
        attributes: ResourceAttributes,
    },
    Removed {
        id: String,
    },
}

impl ResourceChange {
    pub fn id(&self) -> &str {
        match self {
            ResourceChange::AddedOrUpdated { id, .. } | ResourceChange::Removed { id } => id,
        }
    }
}

/// Receives external configuration changes.
pub trait ResourceChangeListener: Send + Sync {
    fn resource_changed(&self, change: ResourceChange);
}

/// Classifies store notifications as echoes or external edits.
#[derive(Clone)]
pub struct ChangeHandler {
    store: Arc<dyn ConfigurationStore>,
    coordinator: Arc<Coordinator>,
    merger: ConfigurationMerger,
}

impl ChangeHandler {
    pub fn new(
        store: Arc<dyn ConfigurationStore>,
        coordinator: Arc<Coordinator>,
        merger: ConfigurationMerger,
    ) -> Self {
        Self {
            store,
            coordinator,
            merger,
        }
    }

    /// The external change a notification represents, if any.
    ///
    /// The ledger lock is held for the whole check.
    pub fn handle(&self, event: &ConfigurationEvent) -> Option<ResourceChange> {
        let factory_pid = event.factory_pid.as_deref();
        let id = codec::event_pid(&event.pid, factory_pid);
        let mut ledger = self.coordinator.lock();

        match event.kind {
            ConfigurationEventKind::Deleted => {
                if ledger.get(&event.pid, factory_pid, true).is_some() {
                    debug!(pid = %event.pid, "ignoring own delete");
                    return None;
                }
                Some(ResourceChange::Removed { id })
            }
            ConfigurationEventKind::Updated => {
                let config = match self.store.get(&event.pid) {
                    Ok(config) => config,
                    Err(e) => {
                        debug!(pid = %event.pid, error = %e, "unable to read changed configuration");
                        return None;
                    }
                };
                if ledger.get(&event.pid, factory_pid, false).is_some() {
                    debug!(pid = %event.pid, "ignoring own update");
                    return None;
                }
                let config = config?;

                let properties = config.properties_or_empty();
                let persist = PropertyValue::to_boolean(properties.get(PROPERTY_PERSISTENCE), true);
                let mut dictionary = clean_configuration(&properties);
                self.merger.remove_default_properties(&id, &mut dictionary);

                Some(ResourceChange::AddedOrUpdated {
                    id: id.clone(),
                    dictionary,
                    attributes: ResourceAttributes {
                        pid: config.pid,
                        factory_pid: config.factory_pid,
                        uri_hint: id,
                        installation_hint: config.bundle_location,
                        persist,
                    },
                })
            }
        }
    }

    /// Handle `event` and pass any resulting change to `listener`.
    pub fn dispatch(&self, event: &ConfigurationEvent, listener: &dyn ResourceChangeListener) {
        if let Some(change) = self.handle(event) {
            debug!(id = %change.id(), "forwarding external change");
            listener.resource_changed(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use pidsync_merge::MergeSchemes;
    use pidsync_store::InMemoryConfigurationStore;
    use pidsync_types::{
        config_entity_id, InstalledResource, ResourceGroup, StaticResourceGroups, TYPE_CONFIG,
    };

    fn handler_with(
        store: Arc<InMemoryConfigurationStore>,
        coordinator: Arc<Coordinator>,
        merger: ConfigurationMerger,
    ) -> ChangeHandler {
        ChangeHandler::new(store, coordinator, merger)
    }

    fn no_merge() -> ConfigurationMerger {
        ConfigurationMerger::new(None, Arc::new(StaticResourceGroups::default()))
    }

    fn setup() -> (Arc<InMemoryConfigurationStore>, Arc<Coordinator>, ChangeHandler) {
        let store = Arc::new(InMemoryConfigurationStore::new());
        let coordinator = Arc::new(Coordinator::new());
        let handler = handler_with(store.clone(), coordinator.clone(), no_merge());
        (store, coordinator, handler)
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ResourceChange>>);

    impl ResourceChangeListener for Recorder {
        fn resource_changed(&self, change: ResourceChange) {
            self.0.lock().unwrap().push(change);
        }
    }

    #[test]
    fn external_update_is_forwarded() {
        let (store, _, handler) = setup();
        store.get_or_create(Some("f"), "n", Some("bundle:x")).unwrap();
        store
            .update("f~n", &ConfigurationRecord::new().with("a", 1).with(PROPERTY_PERSISTENCE, false))
            .unwrap();

        match handler.handle(&ConfigurationEvent::updated("f~n", Some("f".into()))) {
            Some(ResourceChange::AddedOrUpdated { id, dictionary, attributes }) => {
                assert_eq!(id, "f~n");
                assert_eq!(dictionary.get("a"), Some(&PropertyValue::from(1)));
                assert!(!dictionary.contains_key(pidsync_types::SERVICE_PID));
                assert_eq!(attributes.factory_pid.as_deref(), Some("f"));
                assert_eq!(attributes.installation_hint.as_deref(), Some("bundle:x"));
                assert!(!attributes.persist);
            }
            other => panic!("expected AddedOrUpdated, got {other:?}"),
        }
    }

    #[test]
    fn own_update_is_suppressed_once() {
        let (store, coordinator, handler) = setup();
        store.get_or_create(None, "p", None).unwrap();
        store.update("p", &ConfigurationRecord::new().with("a", 1)).unwrap();
        coordinator.add("p", None, false);

        let event = ConfigurationEvent::updated("p", None);
        assert!(handler.handle(&event).is_none());
        assert!(handler.handle(&event).is_some());
    }

    #[test]
    fn update_of_vanished_record_consumes_entry() {
        let (_, coordinator, handler) = setup();
        coordinator.add("p", None, false);
        assert!(handler.handle(&ConfigurationEvent::updated("p", None)).is_none());
        assert_eq!(coordinator.pending(), 0);
    }

    #[test]
    fn delete_forwarded_unless_own() {
        let (_, coordinator, handler) = setup();
        let event = ConfigurationEvent::deleted("f.n", Some("f".into()));
        assert_eq!(
            handler.handle(&event),
            Some(ResourceChange::Removed { id: "f~n".into() })
        );

        coordinator.add("f.n", Some("f"), true);
        assert!(handler.handle(&event).is_none());
    }

    #[test]
    fn update_entry_does_not_suppress_delete() {
        let (_, coordinator, handler) = setup();
        coordinator.add("p", None, false);
        assert!(handler.handle(&ConfigurationEvent::deleted("p", None)).is_some());
        assert_eq!(coordinator.pending(), 1);
    }

    #[test]
    fn read_failure_produces_nothing() {
        let (store, coordinator, handler) = setup();
        coordinator.add("p", None, false);
        store.set_available(false);
        assert!(handler.handle(&ConfigurationEvent::updated("p", None)).is_none());
        assert_eq!(coordinator.pending(), 1);
    }

    #[test]
    fn default_properties_are_stripped() {
        let store = Arc::new(InMemoryConfigurationStore::new());
        let groups = vec![ResourceGroup {
            id: "p".into(),
            alias: None,
            resource_type: TYPE_CONFIG.into(),
            resources: vec![InstalledResource {
                entity_id: config_entity_id("p"),
                scheme: "default".into(),
                dictionary: Some(ConfigurationRecord::new().with("a", 1)),
                priority: 0,
            }],
        }];
        let merger = ConfigurationMerger::new(
            Some(MergeSchemes::new(["default"])),
            Arc::new(StaticResourceGroups::new(groups)),
        );
        let handler = handler_with(store.clone(), Arc::new(Coordinator::new()), merger);
        store.get_or_create(None, "p", None).unwrap();
        store.update("p", &ConfigurationRecord::new().with("a", 1).with("b", 2)).unwrap();

        match handler.handle(&ConfigurationEvent::updated("p", None)) {
            Some(ResourceChange::AddedOrUpdated { dictionary, .. }) => {
                assert_eq!(dictionary, ConfigurationRecord::new().with("b", 2));
            }
            other => panic!("expected AddedOrUpdated, got {other:?}"),
        }
    }

    #[test]
    fn persist_flag_survives_default_pruning() {
        let store = Arc::new(InMemoryConfigurationStore::new());
        let groups = vec![ResourceGroup {
            id: "p".into(),
            alias: None,
            resource_type: TYPE_CONFIG.into(),
            resources: vec![InstalledResource {
                entity_id: config_entity_id("p"),
                scheme: "default".into(),
                dictionary: Some(ConfigurationRecord::new().with(PROPERTY_PERSISTENCE, false)),
                priority: 0,
            }],
        }];
        let merger = ConfigurationMerger::new(
            Some(MergeSchemes::new(["default"])),
            Arc::new(StaticResourceGroups::new(groups)),
        );
        let handler = handler_with(store.clone(), Arc::new(Coordinator::new()), merger);
        store.get_or_create(None, "p", None).unwrap();
        store
            .update("p", &ConfigurationRecord::new().with("a", 1).with(PROPERTY_PERSISTENCE, false))
            .unwrap();

        match handler.handle(&ConfigurationEvent::updated("p", None)) {
            Some(ResourceChange::AddedOrUpdated { dictionary, attributes, .. }) => {
                assert_eq!(dictionary, ConfigurationRecord::new().with("a", 1));
                assert!(!attributes.persist);
            }
            other => panic!("expected AddedOrUpdated, got {other:?}"),
        }
    }

    #[test]
    fn dispatch_reaches_listener() {
        let (_, _, handler) = setup();
        let recorder = Recorder::default();
        handler.dispatch(&ConfigurationEvent::deleted("p", None), &recorder);
        let changes = recorder.0.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id(), "p");
    }

    #[test]
    fn change_serializes_with_tag() {
        let json = serde_json::to_value(ResourceChange::Removed { id: "p".into() }).unwrap();
        assert_eq!(json["change"], "removed");
        assert_eq!(json["id"], "p");
    }
}
