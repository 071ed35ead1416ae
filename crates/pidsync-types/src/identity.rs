use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::TypeError;

/// Separator between factory PID and name in the canonical form.
pub const FACTORY_SEPARATOR: char = '~';

/// Composite identity of a configuration record.
///
/// A plain configuration has only a `name` (its PID). A factory
/// configuration is additionally scoped by `factory_pid`, and its canonical
/// PID is `factory_pid~name`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigurationIdentity {
    pub factory_pid: Option<String>,
    pub name: String,
}

impl ConfigurationIdentity {
    /// Identity of a plain (non-factory) configuration.
    pub fn singleton(pid: impl Into<String>) -> Self {
        Self {
            factory_pid: None,
            name: pid.into(),
        }
    }

    /// Identity of a named factory configuration.
    pub fn factory(factory_pid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            factory_pid: Some(factory_pid.into()),
            name: name.into(),
        }
    }

    pub fn is_factory(&self) -> bool {
        self.factory_pid.is_some()
    }

    /// Canonical PID string.
    pub fn canonical(&self) -> String {
        codec::encode(self.factory_pid.as_deref(), &self.name)
    }

    /// Parse a canonical PID, splitting on the first `~`.
    pub fn from_canonical(id: &str) -> Result<Self, TypeError> {
        if id.is_empty() {
            return Err(TypeError::InvalidId {
                id: id.to_string(),
                reason: "id must not be empty".into(),
            });
        }
        match id.split_once(FACTORY_SEPARATOR) {
            Some((factory_pid, name)) => Ok(Self::factory(factory_pid, name)),
            None => Ok(Self::singleton(id)),
        }
    }
}

impl fmt::Debug for ConfigurationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigurationIdentity({})", self.canonical())
    }
}

impl fmt::Display for ConfigurationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn singleton_canonical_is_name() {
        let id = ConfigurationIdentity::singleton("org.example.Service");
        assert_eq!(id.canonical(), "org.example.Service");
        assert!(!id.is_factory());
    }

    #[test]
    fn factory_canonical_uses_tilde() {
        let id = ConfigurationIdentity::factory("org.example.Factory", "instance");
        assert_eq!(id.to_string(), "org.example.Factory~instance");
    }

    #[test]
    fn from_canonical_splits_first_tilde() {
        let id = ConfigurationIdentity::from_canonical("a.b~c~d").unwrap();
        assert_eq!(id.factory_pid.as_deref(), Some("a.b"));
        assert_eq!(id.name, "c~d");
    }

    #[test]
    fn from_canonical_rejects_empty() {
        assert!(ConfigurationIdentity::from_canonical("").is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let id = ConfigurationIdentity::factory("f", "n");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ConfigurationIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    proptest! {
        #[test]
        fn canonical_roundtrip(f in "[a-zA-Z0-9.\\-]{1,24}", n in "[a-zA-Z0-9.\\-]{1,24}") {
            let id = ConfigurationIdentity::factory(f.clone(), n.clone());
            let parsed = ConfigurationIdentity::from_canonical(&id.canonical()).unwrap();
            prop_assert_eq!(parsed.factory_pid, Some(f));
            prop_assert_eq!(parsed.name, n);
        }
    }
}
