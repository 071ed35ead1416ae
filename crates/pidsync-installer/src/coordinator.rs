//! Ledger of self-initiated store mutations.
//!
//! Before the installer writes or deletes a record it registers an
//! [`Operation`]; when the store's change notification for that mutation
//! comes back, the handler consumes the entry and drops the notification
//! instead of treating it as an external edit.
//!
//! One lock guards the ledger. Callers hold it (through [`Coordinator::lock`])
//! from registration until the store call returns, and the notification
//! handler holds it for its whole check, so a fast notification can never be
//! processed before the entry that explains it exists.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// A pending self-initiated mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub pid: String,
    pub factory_pid: Option<String>,
    pub is_delete: bool,
}

impl Operation {
    fn matches(&self, pid: &str, factory_pid: Option<&str>, is_delete: bool) -> bool {
        self.pid == pid && self.factory_pid.as_deref() == factory_pid && self.is_delete == is_delete
    }
}

/// The shared echo-suppression ledger.
///
/// Entries never expire; one whose notification never arrives stays until a
/// later notification for the same identity consumes it.
#[derive(Debug, Default)]
pub struct Coordinator {
    operations: Mutex<Vec<Operation>>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the ledger lock.
    pub fn lock(&self) -> CoordinatorGuard<'_> {
        let operations = self.operations.lock().unwrap_or_else(PoisonError::into_inner);
        CoordinatorGuard { operations }
    }

    /// Register a mutation under a short-lived lock.
    pub fn add(&self, pid: &str, factory_pid: Option<&str>, is_delete: bool) {
        self.lock().add(pid, factory_pid, is_delete);
    }

    /// Consume the first matching entry under a short-lived lock.
    pub fn get(&self, pid: &str, factory_pid: Option<&str>, is_delete: bool) -> Option<Operation> {
        self.lock().get(pid, factory_pid, is_delete)
    }

    /// Number of entries still waiting for their notification.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }
}

/// Exclusive access to the ledger; the lock is released on drop.
pub struct CoordinatorGuard<'a> {
    operations: MutexGuard<'a, Vec<Operation>>,
}

impl CoordinatorGuard<'_> {
    pub fn add(&mut self, pid: &str, factory_pid: Option<&str>, is_delete: bool) {
        debug!(pid = %pid, factory_pid = ?factory_pid, is_delete, "registering own operation");
        self.operations.push(Operation {
            pid: pid.to_string(),
            factory_pid: factory_pid.map(str::to_string),
            is_delete,
        });
    }

    /// Remove and return the first entry for `(pid, factory_pid)` whose
    /// delete flag equals `is_delete`.
    pub fn get(&mut self, pid: &str, factory_pid: Option<&str>, is_delete: bool) -> Option<Operation> {
        let index = self
            .operations
            .iter()
            .position(|op| op.matches(pid, factory_pid, is_delete))?;
        Some(self.operations.remove(index))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn entry_consumed_at_most_once() {
        let c = Coordinator::new();
        c.add("p", Some("f"), false);
        let op = c.get("p", Some("f"), false).unwrap();
        assert_eq!(op.pid, "p");
        assert_eq!(op.factory_pid.as_deref(), Some("f"));
        assert!(c.get("p", Some("f"), false).is_none());
    }

    #[test]
    fn delete_flag_must_match() {
        let c = Coordinator::new();
        c.add("p", None, true);
        assert!(c.get("p", None, false).is_none());
        assert!(c.get("p", None, true).is_some());
    }

    #[test]
    fn factory_pid_must_match() {
        let c = Coordinator::new();
        c.add("p", Some("f"), false);
        assert!(c.get("p", None, false).is_none());
        assert!(c.get("p", Some("g"), false).is_none());
        assert_eq!(c.pending(), 1);
    }

    #[test]
    fn first_match_wins() {
        let c = Coordinator::new();
        c.add("p", None, false);
        c.add("q", None, false);
        c.add("p", None, false);
        assert!(c.get("p", None, false).is_some());
        assert_eq!(c.pending(), 2);
        assert!(c.get("p", None, false).is_some());
        assert!(c.get("p", None, false).is_none());
    }

    #[test]
    fn guard_holds_lock_across_steps() {
        let c = Coordinator::new();
        let mut guard = c.lock();
        guard.add("p", None, false);
        assert_eq!(guard.len(), 1);
        assert!(guard.get("p", None, false).is_some());
        assert!(guard.is_empty());
    }

    #[test]
    fn concurrent_add_and_get() {
        let c = Arc::new(Coordinator::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    let pid = format!("p{i}");
                    c.add(&pid, None, false);
                    c.get(&pid, None, false).is_some()
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
        assert_eq!(c.pending(), 0);
    }
}
