//! Origin-scoped persistent key-value storage backed by JSON files.
//!
//! Each origin (scheme, host and port) gets its own file under the storage
//! directory, holding a flat JSON object of string values. Every `get`
//! re-reads the file so writes from other processes (the CLI, another
//! storefront instance) are visible, like browser storage shared between
//! tabs. Writes go to a temporary file that is renamed over the original.
//!
//! Concurrent writers are not coordinated beyond this process: the last
//! writer wins.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ezcentials_core::sync::{KeyValueStorage, StorageWriteError};
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors opening or reading a storage file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid origin {0}: {1}")]
    InvalidOrigin(String, String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// File-backed [`KeyValueStorage`] for one origin.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    quota_bytes: usize,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open (or prepare) the storage file for `origin` inside `dir`.
    ///
    /// The directory is created if needed; the file itself is created on
    /// the first write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidOrigin` if `origin` is not a tuple
    /// origin URL, or `StorageError::Io` if the directory cannot be created.
    pub fn for_origin(dir: &Path, origin: &str, quota_bytes: usize) -> Result<Self, StorageError> {
        let file_name = origin_file_name(origin)?;
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(file_name),
            quota_bytes,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable storage file, treating as empty");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageWriteError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut values = self
            .read_all()
            .map_err(|e| StorageWriteError::Backend(e.to_string()))?;

        let others: usize = values
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        let required = others + key.len() + value.len();
        if required > self.quota_bytes {
            return Err(StorageWriteError::QuotaExceeded {
                limit: self.quota_bytes,
                required,
            });
        }

        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
            .map_err(|e| StorageWriteError::Backend(e.to_string()))
    }
}

/// File name for an origin, e.g. `https_shop.ezcentials.de_443.json`.
fn origin_file_name(origin: &str) -> Result<String, StorageError> {
    let url = Url::parse(origin)
        .map_err(|e| StorageError::InvalidOrigin(origin.to_string(), e.to_string()))?;
    let host = url.host_str().ok_or_else(|| {
        StorageError::InvalidOrigin(origin.to_string(), "origin must have a host".to_string())
    })?;
    let port = url.port_or_known_default().ok_or_else(|| {
        StorageError::InvalidOrigin(origin.to_string(), "origin must have a port".to_string())
    })?;

    let sanitized: String = format!("{}_{host}_{port}", url.scheme())
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    Ok(format!("{sanitized}.json"))
}
