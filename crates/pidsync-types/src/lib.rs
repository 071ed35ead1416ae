//! Foundation types for pidsync.
//!
//! pidsync reconciles configuration resources from competing sources into
//! persisted configuration records addressed by a PID, optionally scoped
//! under a factory PID. This crate holds the vocabulary every other pidsync
//! crate shares.
//!
//! # Key Types
//!
//! - [`PropertyValue`] / [`Scalar`] -- configuration property values
//! - [`ConfigurationRecord`] -- a sorted property dictionary
//! - [`ConfigurationIdentity`] -- `(factory_pid, name)` identity of a record
//! - [`codec`] -- canonical and legacy PID encodings
//! - [`ResourceGroup`] / [`ResourceGroupProvider`] -- installed resources

pub mod codec;
pub mod error;
pub mod identity;
pub mod record;
pub mod resource;
pub mod value;

pub use codec::ExtensionMode;
pub use error::TypeError;
pub use identity::ConfigurationIdentity;
pub use record::{
    is_administrative_key, ConfigurationRecord, ADMINISTRATIVE_KEYS, ALIAS_KEY, CONFIG_PATH_KEY,
    PROPERTY_BUNDLE_LOCATION, PROPERTY_PERSISTENCE, SERVICE_FACTORY_PID, SERVICE_PID,
};
pub use resource::{
    config_entity_id, InstalledResource, ResourceGroup, ResourceGroupProvider,
    StaticResourceGroups, TYPE_CONFIG, TYPE_PROPERTIES,
};
pub use value::{PropertyValue, Scalar};
