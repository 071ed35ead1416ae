//! Configuration store interface for pidsync.
//!
//! The persistent store is an external collaborator. This crate defines the
//! narrow surface pidsync consumes and an in-memory backend for tests and
//! embedding.
//!
//! # Surface
//!
//! - [`ConfigurationStore`] -- get, list-by-filter, get-or-create, update,
//!   delete and bundle-location binding, plus the canonical/legacy lookup
//!   chain as provided methods
//! - [`Filter`] -- conjunctive equality filters in LDAP syntax
//! - [`ConfigurationEvent`] -- change notifications (`Updated` / `Deleted`)
//! - [`InMemoryConfigurationStore`] -- `BTreeMap`-backed store with channel
//!   notifications
//!
//! # Rules
//!
//! 1. The store never interprets configuration properties beyond filter
//!    matching.
//! 2. Every property update and delete is followed by exactly one
//!    notification, delivered after the mutation is visible.
//! 3. Errors are propagated; [`StoreError::is_transient`] tells callers
//!    whether to retry.

pub mod configuration;
pub mod error;
pub mod event;
pub mod filter;
pub mod memory;
pub mod traits;

pub use configuration::StoredConfiguration;
pub use error::{StoreError, StoreResult};
pub use event::{ConfigurationEvent, ConfigurationEventKind};
pub use filter::{escape_value, Filter};
pub use memory::InMemoryConfigurationStore;
pub use traits::ConfigurationStore;
