//! Change notifications published by a configuration store.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigurationEventKind {
    Updated,
    Deleted,
}

impl fmt::Display for ConfigurationEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationEventKind::Updated => f.write_str("updated"),
            ConfigurationEventKind::Deleted => f.write_str("deleted"),
        }
    }
}

/// A mutation observed on the store, by any actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationEvent {
    pub kind: ConfigurationEventKind,
    pub pid: String,
    pub factory_pid: Option<String>,
}

impl ConfigurationEvent {
    pub fn updated(pid: impl Into<String>, factory_pid: Option<String>) -> Self {
        Self {
            kind: ConfigurationEventKind::Updated,
            pid: pid.into(),
            factory_pid,
        }
    }

    pub fn deleted(pid: impl Into<String>, factory_pid: Option<String>) -> Self {
        Self {
            kind: ConfigurationEventKind::Deleted,
            pid: pid.into(),
            factory_pid,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.kind == ConfigurationEventKind::Deleted
    }
}
