use serde::{Deserialize, Serialize};

use pidsync_types::{ConfigurationIdentity, ConfigurationRecord};

/// Snapshot of one persisted configuration record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredConfiguration {
    /// Store-assigned PID (canonical `factory~name` for named factory records).
    pub pid: String,
    pub factory_pid: Option<String>,
    /// `None` until the record has been written at least once.
    pub properties: Option<ConfigurationRecord>,
    pub bundle_location: Option<String>,
}

impl StoredConfiguration {
    /// Identity derived from the stored PID.
    ///
    /// Canonical factory PIDs are split back into factory PID and name;
    /// legacy factory records keep their whole PID as the name.
    pub fn identity(&self) -> ConfigurationIdentity {
        match &self.factory_pid {
            Some(factory_pid) => {
                let prefix = format!("{factory_pid}~");
                let name = self.pid.strip_prefix(&prefix).unwrap_or(&self.pid);
                ConfigurationIdentity::factory(factory_pid.clone(), name)
            }
            None => ConfigurationIdentity::singleton(self.pid.clone()),
        }
    }

    /// Properties, or an empty record if never written.
    pub fn properties_or_empty(&self) -> ConfigurationRecord {
        self.properties.clone().unwrap_or_default()
    }
}
