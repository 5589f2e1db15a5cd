//! Executor settings and validation.
//!
//! All fields are optional so partial settings (from flags or environment)
//! fall back to defaults field by field.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of components installed concurrently.
///
/// Kept small: concurrent installs mean concurrent multi-hundred-megabyte
/// wheel downloads.
pub const DEFAULT_PARALLELISM: usize = 2;

/// Default install attempts per invocation (first try plus retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default first backoff delay in milliseconds.
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Default backoff ceiling in milliseconds.
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 15_000;

/// Default per-attempt timeout in seconds.
pub const DEFAULT_STEP_TIMEOUT_SECS: u64 = 30 * 60;

/// Executor settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Maximum components installed at the same time (1-8).
    pub parallelism: Option<usize>,

    /// Attempts per invocation for transient failures (1-10).
    pub max_attempts: Option<u32>,

    /// First retry delay; doubled after every attempt.
    pub backoff_base_ms: Option<u64>,

    /// Upper bound on a single retry delay.
    pub backoff_max_ms: Option<u64>,

    /// Timeout for one install attempt, in seconds.
    pub step_timeout_secs: Option<u64>,
}

impl ExecutorSettings {
    /// Create settings with every field set to its default.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            parallelism: Some(DEFAULT_PARALLELISM),
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            backoff_base_ms: Some(DEFAULT_BACKOFF_BASE_MS),
            backoff_max_ms: Some(DEFAULT_BACKOFF_MAX_MS),
            step_timeout_secs: Some(DEFAULT_STEP_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.unwrap_or(DEFAULT_PARALLELISM).max(1)
    }

    #[must_use]
    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS).max(1)
    }

    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms.unwrap_or(DEFAULT_BACKOFF_BASE_MS))
    }

    #[must_use]
    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms.unwrap_or(DEFAULT_BACKOFF_MAX_MS))
    }

    #[must_use]
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs.unwrap_or(DEFAULT_STEP_TIMEOUT_SECS))
    }

    /// Delay before retry number `retry` (1-based), doubling and capped.
    #[must_use]
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base()
            .saturating_mul(factor)
            .min(self.backoff_max())
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Parallelism must be between 1 and 8, got {0}")]
    InvalidParallelism(usize),

    #[error("Max attempts must be between 1 and 10, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("Backoff base ({base_ms} ms) cannot exceed backoff max ({max_ms} ms)")]
    InvalidBackoff { base_ms: u64, max_ms: u64 },

    #[error("Step timeout must be at least 1 second")]
    InvalidStepTimeout,
}

/// Validate executor settings.
pub fn validate_settings(settings: &ExecutorSettings) -> Result<(), SettingsError> {
    if let Some(parallelism) = settings.parallelism
        && !(1..=8).contains(&parallelism)
    {
        return Err(SettingsError::InvalidParallelism(parallelism));
    }

    if let Some(attempts) = settings.max_attempts
        && !(1..=10).contains(&attempts)
    {
        return Err(SettingsError::InvalidMaxAttempts(attempts));
    }

    let base_ms = settings.backoff_base_ms.unwrap_or(DEFAULT_BACKOFF_BASE_MS);
    let max_ms = settings.backoff_max_ms.unwrap_or(DEFAULT_BACKOFF_MAX_MS);
    if base_ms > max_ms {
        return Err(SettingsError::InvalidBackoff { base_ms, max_ms });
    }

    if settings.step_timeout_secs == Some(0) {
        return Err(SettingsError::InvalidStepTimeout);
    }

    Ok(())
}
