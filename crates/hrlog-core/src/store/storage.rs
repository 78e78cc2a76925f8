use crate::errors::PersistError;
use std::cell::Cell;
use std::collections::BTreeMap;

/// A string key-value medium with limited capacity
///
/// `set` signals a full medium with [`PersistError::CapacityExceeded`]; any
/// other failure is a backend error. The medium is not synchronized: two
/// writers to the same key simply overwrite each other.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;

    /// Every key currently stored
    fn keys(&self) -> Result<Vec<String>, PersistError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, PersistError> {
        (**self).keys()
    }
}

/// In-memory medium
///
/// Usage is measured as the byte length of every key plus its value. With
/// a quota set, a write that would push usage over the quota fails with
/// `CapacityExceeded`. `fail_next_sets` forces the next writes to fail
/// regardless of usage; `fail_next_gets` makes the next reads fail with a
/// backend error.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    forced_failures: usize,
    forced_read_failures: Cell<usize>,
    set_calls: usize,
}

impl MemoryStorage {
    /// Unlimited medium
    pub fn new() -> Self {
        Self::default()
    }

    /// Medium holding at most `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Make the next `count` calls to `set` fail with `CapacityExceeded`
    pub fn fail_next_sets(&mut self, count: usize) {
        self.forced_failures = count;
    }

    /// Make the next `count` calls to `get` fail with a backend error
    pub fn fail_next_gets(&mut self, count: usize) {
        self.forced_read_failures.set(count);
    }

    pub fn set_quota(&mut self, quota_bytes: Option<usize>) {
        self.quota_bytes = quota_bytes;
    }

    /// Bytes currently used by keys and values
    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Number of `set` calls made so far, failed ones included
    pub fn set_calls(&self) -> usize {
        self.set_calls
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let pending = self.forced_read_failures.get();
        if pending > 0 {
            self.forced_read_failures.set(pending - 1);
            return Err(PersistError::Backend {
                message: format!("read of {} failed", key),
            });
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.set_calls += 1;
        let bytes = key.len() + value.len();

        if self.forced_failures > 0 {
            self.forced_failures -= 1;
            return Err(PersistError::CapacityExceeded {
                key: key.to_string(),
                bytes,
            });
        }

        if let Some(quota) = self.quota_bytes {
            let replaced = self.entries.get(key).map_or(0, |old| key.len() + old.len());
            if self.used_bytes() - replaced + bytes > quota {
                return Err(PersistError::CapacityExceeded {
                    key: key.to_string(),
                    bytes,
                });
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
