//! Configuration installer for pidsync.
//!
//! Writes resource dictionaries into the configuration store, recognizes the
//! store notifications its own writes cause, reports external edits, and
//! migrates groups left behind by legacy naming schemes.
//!
//! # Components
//!
//! - [`Coordinator`] -- ledger of self-initiated mutations (echo suppression)
//! - [`ConfigTask`] / [`create_task`] -- the write path
//! - [`ChangeHandler`] -- store notifications to [`ResourceChange`]s
//! - [`transform`] -- property-file resources to configuration identities
//! - [`MigrationResolver`] -- legacy identifier migration
//! - [`Installer`] -- all of the above behind one handle

pub mod config;
pub mod coordinator;
pub mod error;
pub mod installer;
pub mod listener;
pub mod migration;
pub mod task;
pub mod transformer;

pub use config::InstallerConfig;
pub use coordinator::{Coordinator, CoordinatorGuard, Operation};
pub use error::{InstallerError, InstallerResult};
pub use installer::Installer;
pub use listener::{ChangeHandler, ResourceAttributes, ResourceChange, ResourceChangeListener};
pub use migration::{classify, MigrationReport, MigrationResolver, MigrationState, UpdatableGroup};
pub use task::{create_task, ConfigTask, ResourceState, TaskContext, TaskResource, TaskResourceGroup};
pub use transformer::{transform, RegisteredResource, TransformationResult};
