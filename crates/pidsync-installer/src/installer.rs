use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pidsync_merge::ConfigurationMerger;
use pidsync_store::{ConfigurationEvent, ConfigurationStore};
use pidsync_types::ResourceGroupProvider;
use tracing::info;

use crate::config::InstallerConfig;
use crate::coordinator::Coordinator;
use crate::listener::{ChangeHandler, ResourceChange, ResourceChangeListener};
use crate::migration::{MigrationReport, MigrationResolver, UpdatableGroup};
use crate::task::{self, ConfigTask, TaskContext, TaskResourceGroup};
use crate::transformer::{self, RegisteredResource, TransformationResult};

/// Entry point tying the installer components to one store.
///
/// All components share a single [`Coordinator`], so writes made through
/// [`Installer::execute`] or [`Installer::migrate`] are recognized when their
/// notifications reach [`Installer::handle_event`].
pub struct Installer {
    config: InstallerConfig,
    store: Arc<dyn ConfigurationStore>,
    coordinator: Arc<Coordinator>,
    handler: ChangeHandler,
    resolver: MigrationResolver,
    active: Arc<AtomicBool>,
}

impl Installer {
    pub fn new(
        config: InstallerConfig,
        store: Arc<dyn ConfigurationStore>,
        groups: Arc<dyn ResourceGroupProvider>,
    ) -> Self {
        let coordinator = Arc::new(Coordinator::new());
        let active = Arc::new(AtomicBool::new(true));
        let merger = ConfigurationMerger::new(config.merge_schemes.clone(), groups);
        let handler = ChangeHandler::new(Arc::clone(&store), Arc::clone(&coordinator), merger);
        let resolver = MigrationResolver::new(Arc::clone(&store), Arc::clone(&coordinator), Arc::clone(&active));

        info!(
            default_location = ?config.default_location,
            merge_schemes = ?config.merge_schemes.as_ref().map(ToString::to_string),
            legacy_extensions = config.legacy_extensions,
            "configuration installer activated"
        );

        Self {
            config,
            store,
            coordinator,
            handler,
            resolver,
            active,
        }
    }

    /// Replace the migration resolver's completion callback.
    pub fn on_migration_complete(
        mut self,
        callback: impl Fn(&MigrationReport) + Send + Sync + 'static,
    ) -> Self {
        self.resolver = self.resolver.with_completion_callback(callback);
        self
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop further migration work.
    pub fn deactivate(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("configuration installer deactivated");
        }
    }

    pub fn create_task(&self, group: &TaskResourceGroup) -> Option<ConfigTask> {
        task::create_task(group)
    }

    pub fn execute(&self, task: &ConfigTask, group: &mut TaskResourceGroup) {
        let ctx = TaskContext {
            store: self.store.as_ref(),
            coordinator: &self.coordinator,
            config: &self.config,
        };
        task.execute(group, &ctx);
    }

    pub fn transform(&self, resource: &RegisteredResource) -> Option<TransformationResult> {
        transformer::transform(resource, self.config.extension_mode())
    }

    pub fn handle_event(&self, event: &ConfigurationEvent) -> Option<ResourceChange> {
        self.handler.handle(event)
    }

    pub fn dispatch_event(&self, event: &ConfigurationEvent, listener: &dyn ResourceChangeListener) {
        self.handler.dispatch(event, listener);
    }

    pub fn migrate(&self, groups: &mut [UpdatableGroup]) -> MigrationReport {
        self.resolver.update(groups)
    }
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("config", &self.config)
            .field("pending_operations", &self.coordinator.pending())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
