//! Cache for parsed `package.json` manifests.
//!
//! Directory candidates under a popular alias read the same manifest over and
//! over. A cached value is only served while the file's mtime and size are
//! unchanged.

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tspaths_util::fs::mtime_and_size;

/// Metadata a cached manifest is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestStamp {
    pub mtime_ms: Option<u64>,
    pub size: u64,
}

impl ManifestStamp {
    /// Stamp of the file as it is now; `None` if it has no metadata.
    #[must_use]
    pub fn read(path: &Path) -> Option<Self> {
        mtime_and_size(path).map(|(mtime_ms, size)| Self { mtime_ms, size })
    }

    /// Whether `path` still carries this stamp.
    #[must_use]
    pub fn is_current(&self, path: &Path) -> bool {
        Self::read(path).as_ref() == Some(self)
    }
}

/// Storage for parsed manifests, shared by concurrent lookups.
pub trait ManifestCache: Send + Sync + std::fmt::Debug {
    /// A still-valid manifest for `path`.
    fn get(&self, path: &Path) -> Option<Value>;

    fn set(&self, path: &Path, value: Value);
}

/// Manifests keyed by path, dropped on first lookup after the file changes.
#[derive(Debug, Default)]
pub struct StampedManifestCache {
    entries: Mutex<HashMap<PathBuf, (ManifestStamp, Value)>>,
}

impl StampedManifestCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored entries, including ones not yet found stale.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ManifestCache for StampedManifestCache {
    fn get(&self, path: &Path) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let (stamp, value) = entries.get(path)?;
        if stamp.is_current(path) {
            return Some(value.clone());
        }
        entries.remove(path);
        None
    }

    fn set(&self, path: &Path, value: Value) {
        // Unstampable files are not worth caching; the next read fails anyway.
        let Some(stamp) = ManifestStamp::read(path) else {
            return;
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), (stamp, value));
    }
}
