//! The shared user mapping.

use crate::events::Admission;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mapping from user identifier to stored value.
///
/// Every read and write takes the same lock, so the event loop and direct
/// admissions can run concurrently without racing. Clones share the same
/// mapping.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl UserTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panic while holding the lock cannot leave the map half-written
    /// (every critical section is a single map operation), so a poisoned
    /// lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the admission's value under its identifier.
    ///
    /// Returns the value previously stored for that identifier, if any.
    pub fn apply(&self, admission: &Admission) -> Option<String> {
        self.lock()
            .insert(admission.user.clone(), admission.stored_value())
    }

    pub fn get(&self, user: &str) -> Option<String> {
        self.lock().get(user).cloned()
    }

    pub fn contains(&self, user: &str) -> bool {
        self.lock().contains_key(user)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the mapping, ordered by identifier for stable display.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
