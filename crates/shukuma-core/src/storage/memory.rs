use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{SecureStore, StoreError};

/// Process-local `SecureStore`.
///
/// Nothing survives the process. Failures can be switched on to exercise
/// the callers' error policies: reads, writes (puts and deletes), or deletes
/// of individual keys. An injected failure never touches the stored values.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    failing_deletes: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `get` fail until switched off
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `put` and `delete` fail until switched off
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `delete` fail for one key only
    pub fn fail_deletes_for(&self, key: &str) -> Result<(), StoreError> {
        self.failing_deletes()?.insert(key.to_string());
        Ok(())
    }

    /// Whether `key` holds a value, ignoring injected read failures
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn failing_deletes(&self) -> Result<MutexGuard<'_, HashSet<String>>, StoreError> {
        self.failing_deletes
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl SecureStore for MemoryStore {
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("simulated write failure for {}", key)));
        }
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("simulated read failure for {}", key)));
        }
        Ok(self.entries()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) || self.failing_deletes()?.contains(key) {
            return Err(StoreError::Unavailable(format!("simulated delete failure for {}", key)));
        }
        self.entries()?.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
