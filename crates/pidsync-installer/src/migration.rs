//! Migration of configuration groups from legacy identifiers.
//!
//! Older installations named factory configurations `factoryPid-name` or
//! recorded a generated alias next to them, and stored the record under a
//! non-canonical PID. A migration pass renames such groups to the canonical
//! `factoryPid~name` form and moves the stored record along.
//!
//! Migration never blocks startup: a store failure is logged, counted, and
//! the group is still finished. A later pass simply finds nothing left to
//! move.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pidsync_diff::clean_configuration;
use pidsync_store::{ConfigurationStore, StoreResult, StoredConfiguration};
use pidsync_types::codec::{self, LEGACY_FACTORY_SEPARATOR};
use pidsync_types::identity::FACTORY_SEPARATOR;
use pidsync_types::{ConfigurationIdentity, TYPE_CONFIG};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::coordinator::{Coordinator, CoordinatorGuard};

/// Where a group stands in the migration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    /// Legacy alias or `-` separator; the group must be renamed.
    NeedsRename,
    /// Canonical, but a legacy duplicate may still be stored.
    DuplicateCheck,
    /// Nothing to do.
    Done,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationState::NeedsRename => f.write_str("needs-rename"),
            MigrationState::DuplicateCheck => f.write_str("duplicate-check"),
            MigrationState::Done => f.write_str("done"),
        }
    }
}

/// An installed resource group whose identifier may be rewritten.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatableGroup {
    pub id: String,
    pub alias: Option<String>,
    pub resource_type: String,
    /// Set once the group has been migrated.
    pub updated: bool,
}

impl UpdatableGroup {
    pub fn config(id: impl Into<String>, alias: Option<&str>) -> Self {
        Self {
            id: id.into(),
            alias: alias.map(str::to_string),
            resource_type: TYPE_CONFIG.to_string(),
            updated: false,
        }
    }
}

/// Migration state of `group`, without touching anything.
pub fn classify(group: &UpdatableGroup) -> MigrationState {
    if group.resource_type != TYPE_CONFIG {
        return MigrationState::Done;
    }
    let legacy_separator = group.id.contains(LEGACY_FACTORY_SEPARATOR);
    if group.alias.is_none() && group.id.contains(FACTORY_SEPARATOR) && legacy_separator {
        MigrationState::DuplicateCheck
    } else if group.alias.is_some() || legacy_separator {
        MigrationState::NeedsRename
    } else {
        MigrationState::Done
    }
}

/// Outcome of one migration pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// State of each processed group, by its identifier before the pass.
    pub states: Vec<(String, MigrationState)>,
    /// Groups given a canonical identifier.
    pub renamed: usize,
    /// Stored records moved to their canonical PID.
    pub migrated: usize,
    /// Leftover legacy records deleted.
    pub duplicates_removed: usize,
    /// Groups whose store work failed.
    pub failures: usize,
    /// Whether the pass stopped early because the installer went inactive.
    pub interrupted: bool,
}

type CompletionCallback = Box<dyn Fn(&MigrationReport) + Send + Sync>;

/// Runs migration passes over installed configuration groups.
pub struct MigrationResolver {
    store: Arc<dyn ConfigurationStore>,
    coordinator: Arc<Coordinator>,
    active: Arc<AtomicBool>,
    on_complete: Option<CompletionCallback>,
}

impl MigrationResolver {
    pub fn new(
        store: Arc<dyn ConfigurationStore>,
        coordinator: Arc<Coordinator>,
        active: Arc<AtomicBool>,
    ) -> Self {
        Self {
            store,
            coordinator,
            active,
            on_complete: None,
        }
    }

    /// Invoke `callback` with the report at the end of every pass.
    pub fn with_completion_callback(
        mut self,
        callback: impl Fn(&MigrationReport) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Migrate every configuration group in `groups`, in order.
    pub fn update(&self, groups: &mut [UpdatableGroup]) -> MigrationReport {
        let mut report = MigrationReport::default();

        for group in groups.iter_mut() {
            if !self.active.load(Ordering::SeqCst) {
                debug!("installer inactive, stopping migration");
                report.interrupted = true;
                break;
            }
            if group.resource_type != TYPE_CONFIG {
                continue;
            }
            let state = self.resolve(group, &mut report);
            report.states.push((group.id.clone(), state));
        }

        if report.renamed + report.duplicates_removed > 0 {
            info!(
                renamed = report.renamed,
                migrated = report.migrated,
                duplicates_removed = report.duplicates_removed,
                failures = report.failures,
                "configuration migration finished"
            );
        }
        if let Some(callback) = &self.on_complete {
            callback(&report);
        }
        report
    }

    /// Migrate one group; returns the state it was found in.
    fn resolve(&self, group: &mut UpdatableGroup, report: &mut MigrationReport) -> MigrationState {
        let state = classify(group);
        match state {
            MigrationState::DuplicateCheck => self.remove_duplicate(group, report),
            MigrationState::NeedsRename => self.rename(group, report),
            MigrationState::Done => {}
        }
        state
    }

    fn remove_duplicate(&self, group: &UpdatableGroup, report: &mut MigrationReport) {
        let Some((factory_pid, name)) = group.id.rsplit_once(FACTORY_SEPARATOR) else {
            return;
        };
        let mut ledger = self.coordinator.lock();
        let result = self
            .store
            .legacy_factory_configuration(factory_pid, None, name)
            .and_then(|found| match found {
                Some(legacy) => self.delete(&mut ledger, &legacy).map(|()| true),
                None => Ok(false),
            });
        match result {
            Ok(true) => {
                debug!(id = %group.id, "removed leftover legacy configuration");
                report.duplicates_removed += 1;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(id = %group.id, error = %e, "unable to check for legacy duplicate");
                report.failures += 1;
            }
        }
    }

    fn rename(&self, group: &mut UpdatableGroup, report: &mut MigrationReport) {
        let alias = group.alias.take();
        let identity = match codec::decode_legacy_alias(alias.as_deref(), &group.id) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(id = %group.id, alias = ?alias, error = %e, "unable to decode legacy identifier");
                group.alias = alias;
                group.updated = true;
                report.failures += 1;
                return;
            }
        };

        let old_id = std::mem::replace(&mut group.id, identity.canonical());
        report.renamed += 1;
        debug!(old_id = %old_id, id = %group.id, "renamed configuration group");

        match self.move_record(&identity, alias.as_deref()) {
            Ok(true) => report.migrated += 1,
            Ok(false) => {}
            Err(e) => {
                warn!(id = %group.id, error = %e, "unable to migrate legacy configuration");
                report.failures += 1;
            }
        }
        group.updated = true;
    }

    /// Move the legacy record of `identity`, if any, to its canonical PID.
    fn move_record(&self, identity: &ConfigurationIdentity, alias: Option<&str>) -> StoreResult<bool> {
        let Some(factory_pid) = identity.factory_pid.as_deref() else {
            return Ok(false);
        };
        let mut ledger = self.coordinator.lock();
        let Some(legacy) = self
            .store
            .legacy_factory_configuration(factory_pid, alias, &identity.name)?
        else {
            return Ok(false);
        };

        let properties = clean_configuration(&legacy.properties_or_empty());
        let location = legacy.bundle_location.clone();
        self.delete(&mut ledger, &legacy)?;

        let created = self
            .store
            .get_or_create(Some(factory_pid), &identity.name, location.as_deref())?;
        if created.bundle_location != location {
            self.store.set_bundle_location(&created.pid, location.as_deref())?;
        }
        ledger.add(&created.pid, created.factory_pid.as_deref(), false);
        if let Err(e) = self.store.update(&created.pid, &properties) {
            ledger.get(&created.pid, created.factory_pid.as_deref(), false);
            return Err(e);
        }
        info!(from = %legacy.pid, to = %created.pid, "migrated legacy configuration");
        Ok(true)
    }

    fn delete(&self, ledger: &mut CoordinatorGuard<'_>, config: &StoredConfiguration) -> StoreResult<()> {
        let factory_pid = config.factory_pid.as_deref();
        ledger.add(&config.pid, factory_pid, true);
        match self.store.delete(&config.pid) {
            Ok(true) => Ok(()),
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
}

impl fmt::Debug for MigrationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationResolver")
            .field("active", &self.active.load(Ordering::SeqCst))
            .field("has_completion_callback", &self.on_complete.is_some())
            .finish()
    }
}
