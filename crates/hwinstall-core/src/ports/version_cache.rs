//! Installed-version cache port.
//!
//! An optional cache of "last verified installed version" per package,
//! used to skip package-manager queries on repeat runs. A miss always
//! falls back to a direct query.

use thiserror::Error;

/// Errors from persisting cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to write version cache {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Port for the installed-version cache.
pub trait VersionCachePort: Send + Sync {
    /// Last verified installed version of `package`.
    fn get(&self, package: &str) -> Option<String>;

    /// Record a verified installed version.
    fn record(&self, package: &str, version: &str) -> Result<(), CacheError>;
}
