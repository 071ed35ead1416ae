//! The write path: tasks that install, remove or re-state configuration
//! resources.

use std::fmt;

use pidsync_diff::{diff_records, is_same_data};
use pidsync_merge::effective_install_dictionary;
use pidsync_store::{ConfigurationStore, StoreResult};
use pidsync_types::{
    config_entity_id, ConfigurationIdentity, ConfigurationRecord, InstalledResource, PropertyValue,
    PROPERTY_BUNDLE_LOCATION, PROPERTY_PERSISTENCE, TYPE_CONFIG,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::InstallerConfig;
use crate::coordinator::Coordinator;

/// Sort-key prefix of state-change tasks.
pub const CHANGE_STATE_ORDER: &str = "00-";

/// Sort-key prefix of remove tasks; removals run before installs.
pub const CONFIG_REMOVE_ORDER: &str = "10-";

/// Sort-key prefix of install tasks.
pub const CONFIG_INSTALL_ORDER: &str = "20-";

/// Lifecycle state of a resource known to the installer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    Install,
    Uninstall,
    Installed,
    Uninstalled,
    Ignored,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceState::Install => "INSTALL",
            ResourceState::Uninstall => "UNINSTALL",
            ResourceState::Installed => "INSTALLED",
            ResourceState::Uninstalled => "UNINSTALLED",
            ResourceState::Ignored => "IGNORED",
        };
        f.write_str(s)
    }
}

/// One resource of a task group.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskResource {
    pub identity: ConfigurationIdentity,
    pub resource_type: String,
    pub resource: InstalledResource,
    pub state: ResourceState,
    /// Template resources never take over from an uninstalled one.
    pub template: bool,
}

impl TaskResource {
    /// A configuration resource in state [`ResourceState::Install`].
    pub fn config(
        identity: ConfigurationIdentity,
        scheme: impl Into<String>,
        dictionary: Option<ConfigurationRecord>,
        priority: i32,
    ) -> Self {
        let entity_id = config_entity_id(&identity.canonical());
        Self {
            identity,
            resource_type: TYPE_CONFIG.to_string(),
            resource: InstalledResource {
                entity_id,
                scheme: scheme.into(),
                dictionary,
                priority,
            },
            state: ResourceState::Install,
            template: false,
        }
    }

    pub fn with_state(mut self, state: ResourceState) -> Self {
        self.state = state;
        self
    }

    pub fn as_template(mut self) -> Self {
        self.template = true;
        self
    }

    pub fn entity_id(&self) -> &str {
        &self.resource.entity_id
    }

    fn is_active(&self) -> bool {
        !matches!(self.state, ResourceState::Uninstalled | ResourceState::Ignored)
    }
}

/// All resources competing for one entity, highest priority first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskResourceGroup {
    pub resources: Vec<TaskResource>,
    /// Diagnostic left by the last task that failed.
    pub message: Option<String>,
}

impl TaskResourceGroup {
    pub fn new(resources: Vec<TaskResource>) -> Self {
        Self {
            resources,
            message: None,
        }
    }

    /// The resource a task acts on.
    pub fn active_resource(&self) -> Option<&TaskResource> {
        self.resources.first()
    }

    /// The resource that would take over from the active one.
    pub fn next_active_resource(&self) -> Option<&TaskResource> {
        self.resources.get(1)
    }

    /// Active resources after the first, in priority order.
    pub fn active_siblings(&self) -> impl Iterator<Item = &InstalledResource> {
        self.resources
            .iter()
            .skip(1)
            .filter(|r| r.is_active())
            .map(|r| &r.resource)
    }

    /// Record the outcome of a task on the active resource.
    pub fn set_finish_state(&mut self, state: ResourceState, message: Option<String>) {
        if let Some(active) = self.resources.first_mut() {
            active.state = state;
        }
        self.message = message;
    }
}

/// Collaborators a task runs against.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    pub store: &'a dyn ConfigurationStore,
    pub coordinator: &'a Coordinator,
    pub config: &'a InstallerConfig,
}

/// A unit of work for one resource group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigTask {
    Install(ConfigurationIdentity),
    Remove(ConfigurationIdentity),
    ChangeState { entity_id: String, state: ResourceState },
}

/// Task for a group whose active resource is a configuration.
///
/// An uninstalled resource hands over without touching the store when the
/// next resource is already (or about to be) installed and is not a
/// template; otherwise the record is removed. Anything else installs.
pub fn create_task(group: &TaskResourceGroup) -> Option<ConfigTask> {
    let active = group.active_resource()?;
    if active.resource_type != TYPE_CONFIG {
        return None;
    }

    if active.state != ResourceState::Uninstall {
        return Some(ConfigTask::Install(active.identity.clone()));
    }

    let handover = group.next_active_resource().is_some_and(|next| {
        !next.template
            && matches!(
                next.state,
                ResourceState::Ignored | ResourceState::Installed | ResourceState::Install
            )
    });
    if handover {
        Some(ConfigTask::ChangeState {
            entity_id: active.entity_id().to_string(),
            state: ResourceState::Uninstalled,
        })
    } else {
        Some(ConfigTask::Remove(active.identity.clone()))
    }
}

impl ConfigTask {
    /// Key tasks are ordered by: state changes, then removals, then installs.
    pub fn sort_key(&self) -> String {
        match self {
            ConfigTask::ChangeState { entity_id, .. } => format!("{CHANGE_STATE_ORDER}{entity_id}"),
            ConfigTask::Remove(identity) => format!("{CONFIG_REMOVE_ORDER}{}", identity.canonical()),
            ConfigTask::Install(identity) => format!("{CONFIG_INSTALL_ORDER}{}", identity.canonical()),
        }
    }

    /// Run the task and record its outcome on `group`.
    ///
    /// Transient store failures leave the group untouched so the task can be
    /// retried; any other failure marks the active resource ignored.
    pub fn execute(&self, group: &mut TaskResourceGroup, ctx: &TaskContext<'_>) {
        match self {
            ConfigTask::ChangeState { state, .. } => group.set_finish_state(*state, None),
            ConfigTask::Install(identity) => {
                let dictionary = group
                    .active_resource()
                    .and_then(|r| r.resource.dictionary.clone())
                    .unwrap_or_default();
                match install_configuration(identity, dictionary, group, ctx) {
                    Ok(()) => group.set_finish_state(ResourceState::Installed, None),
                    Err(e) if e.is_transient() => {
                        debug!(pid = %identity, error = %e, "store unavailable, install deferred");
                    }
                    Err(e) => {
                        error!(pid = %identity, error = %e, "unable to install configuration");
                        group.set_finish_state(
                            ResourceState::Ignored,
                            Some(format!("unable to install configuration {identity}: {e}")),
                        );
                    }
                }
            }
            ConfigTask::Remove(identity) => match remove_configuration(identity, ctx) {
                Ok(()) => group.set_finish_state(ResourceState::Uninstalled, None),
                Err(e) if e.is_transient() => {
                    debug!(pid = %identity, error = %e, "store unavailable, removal deferred");
                }
                Err(e) => {
                    error!(pid = %identity, error = %e, "unable to remove configuration");
                    group.set_finish_state(
                        ResourceState::Ignored,
                        Some(format!("unable to remove configuration {identity}: {e}")),
                    );
                }
            },
        }
    }
}

/// Bundle location for a resource dictionary: its own hint, else the
/// configured default. An empty location means none.
fn install_location(dictionary: &ConfigurationRecord, config: &InstallerConfig) -> Option<String> {
    dictionary
        .get(PROPERTY_BUNDLE_LOCATION)
        .and_then(PropertyValue::as_str)
        .map(str::to_string)
        .or_else(|| config.default_location.clone())
        .filter(|location| !location.is_empty())
}

fn install_configuration(
    identity: &ConfigurationIdentity,
    mut dictionary: ConfigurationRecord,
    group: &TaskResourceGroup,
    ctx: &TaskContext<'_>,
) -> StoreResult<()> {
    let location = install_location(&dictionary, ctx.config);
    dictionary.remove(PROPERTY_BUNDLE_LOCATION);
    dictionary.remove(PROPERTY_PERSISTENCE);
    let mut effective =
        effective_install_dictionary(ctx.config.merge_schemes.as_ref(), &dictionary, group.active_siblings());
    // Siblings may carry their own resource-control properties.
    effective.remove(PROPERTY_BUNDLE_LOCATION);
    effective.remove(PROPERTY_PERSISTENCE);

    let factory_pid = identity.factory_pid.as_deref();
    let mut ledger = ctx.coordinator.lock();

    let config = match ctx.store.find_configuration(factory_pid, &identity.name)? {
        Some(existing) => {
            if existing.properties.as_ref().is_some_and(|p| is_same_data(p, &effective)) {
                debug!(pid = %existing.pid, "configuration already holds the same data");
                return Ok(());
            }
            existing
        }
        None => ctx.store.get_or_create(factory_pid, &identity.name, location.as_deref())?,
    };

    if config.bundle_location != location {
        ctx.store.set_bundle_location(&config.pid, location.as_deref())?;
    }

    let diff = diff_records(&config.properties_or_empty(), &effective);
    debug!(
        pid = %config.pid,
        added = diff.additions(),
        removed = diff.removals(),
        modified = diff.modifications(),
        "writing configuration"
    );

    let factory_pid = config.factory_pid.as_deref();
    ledger.add(&config.pid, factory_pid, false);
    if let Err(e) = ctx.store.update(&config.pid, &effective) {
        ledger.get(&config.pid, factory_pid, false);
        return Err(e);
    }
    info!(pid = %config.pid, "installed configuration");
    Ok(())
}

fn remove_configuration(identity: &ConfigurationIdentity, ctx: &TaskContext<'_>) -> StoreResult<()> {
    let mut ledger = ctx.coordinator.lock();
    let Some(config) = ctx.store.find_configuration(identity.factory_pid.as_deref(), &identity.name)? else {
        debug!(pid = %identity, "cannot delete configuration, not found");
        return Ok(());
    };

    let factory_pid = config.factory_pid.as_deref();
    ledger.add(&config.pid, factory_pid, true);
    match ctx.store.delete(&config.pid) {
        Ok(true) => {
            info!(pid = %config.pid, "removed configuration");
            Ok(())
        }
        Ok(false) => {
            ledger.get(&config.pid, factory_pid, true);
            Ok(())
        }
        Err(e) => {
            ledger.get(&config.pid, factory_pid, true);
            Err(e)
        }
    }
}
