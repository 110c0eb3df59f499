//! In-memory key-value storage.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{KeyValueStorage, StorageWriteError};

/// A [`KeyValueStorage`] held in process memory.
///
/// Used by tests and by hosts that have no persistent medium. An optional
/// quota counts key and value bytes the way browser storage does, and
/// writes can be switched to fail to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    quota_bytes: Option<usize>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStorage {
    /// Create an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that refuses writes beyond `quota_bytes`.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                quota_bytes: Some(quota_bytes),
                ..Inner::default()
            }),
        }
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageWriteError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageWriteError::Backend(
                "writes are disabled".to_string(),
            ));
        }

        if let Some(limit) = inner.quota_bytes {
            let others: usize = inner
                .values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let required = others + key.len() + value.len();
            if required > limit {
                return Err(StorageWriteError::QuotaExceeded { limit, required });
            }
        }

        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}
