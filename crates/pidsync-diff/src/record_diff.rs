//! Record-level diff: what an install would change in a stored record.
//!
//! Administrative keys are skipped and values compare with
//! [`is_same_value`], so a diff is empty exactly when
//! [`is_same_data`](crate::is_same_data) holds.

use pidsync_types::{is_administrative_key, ConfigurationRecord, PropertyValue};
use serde::Serialize;

use crate::normalize::is_same_value;

/// The result of comparing two records.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RecordDiff {
    pub changes: Vec<RecordChange>,
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn additions(&self) -> usize {
        self.count(|c| matches!(c, RecordChange::Added { .. }))
    }

    pub fn removals(&self) -> usize {
        self.count(|c| matches!(c, RecordChange::Removed { .. }))
    }

    pub fn modifications(&self) -> usize {
        self.count(|c| matches!(c, RecordChange::Modified { .. }))
    }

    fn count(&self, pred: impl Fn(&RecordChange) -> bool) -> usize {
        self.changes.iter().filter(|c| pred(c)).count()
    }
}

/// A single property change.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "change", rename_all = "lowercase")]
pub enum RecordChange {
    Added { key: String, value: PropertyValue },
    Removed { key: String, value: PropertyValue },
    Modified { key: String, old: PropertyValue, new: PropertyValue },
}

/// Compute the diff from `old` to `new`, in key order.
pub fn diff_records(old: &ConfigurationRecord, new: &ConfigurationRecord) -> RecordDiff {
    let mut changes = Vec::new();

    for (key, old_val) in old.iter().filter(|(k, _)| !is_administrative_key(k)) {
        match new.get(key) {
            Some(new_val) if !is_same_value(Some(old_val), Some(new_val)) => {
                changes.push(RecordChange::Modified {
                    key: key.to_string(),
                    old: old_val.clone(),
                    new: new_val.clone(),
                });
            }
            Some(_) => {}
            None => changes.push(RecordChange::Removed {
                key: key.to_string(),
                value: old_val.clone(),
            }),
        }
    }

    for (key, new_val) in new.iter().filter(|(k, _)| !is_administrative_key(k)) {
        if !old.contains_key(key) {
            changes.push(RecordChange::Added {
                key: key.to_string(),
                value: new_val.clone(),
            });
        }
    }

    RecordDiff { changes }
}
