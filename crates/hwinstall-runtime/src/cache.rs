//! Installed-version cache adapters.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hwinstall_core::{CacheError, VersionCachePort};
use tracing::{debug, warn};

/// JSON file mapping package name to last verified installed version.
///
/// A missing, unreadable or corrupt file loads as an empty cache. Every
/// `record` rewrites the whole file.
#[derive(Debug)]
pub struct FileVersionCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileVersionCache {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        debug!(path = %path.display(), entries = entries.len(), "Loaded version cache");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        let write_err = |reason: String| CacheError::Write {
            path: self.path.display().to_string(),
            reason,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(entries).map_err(|e| write_err(e.to_string()))?;

        // Write-then-rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|e| write_err(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| write_err(e.to_string()))
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Version cache unreadable, starting empty");
            return BTreeMap::new();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Version cache corrupt, starting empty");
        BTreeMap::new()
    })
}

impl VersionCachePort for FileVersionCache {
    fn get(&self, package: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(package).cloned())
    }

    fn record(&self, package: &str, version: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|e| CacheError::Write {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        entries.insert(package.to_string(), version.to_string());
        self.persist(&entries)
    }
}

/// Process-local cache, useful when nothing should touch disk.
#[derive(Debug, Default)]
pub struct InMemoryVersionCache {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryVersionCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VersionCachePort for InMemoryVersionCache {
    fn get(&self, package: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(package).cloned())
    }

    fn record(&self, package: &str, version: &str) -> Result<(), CacheError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(package.to_string(), version.to_string());
        }
        Ok(())
    }
}
