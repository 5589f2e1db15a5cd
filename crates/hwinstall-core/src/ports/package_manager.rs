//! Package manager port.
//!
//! Abstracts the host package manager (e.g. pip) behind intent-based
//! calls: "which version is installed" and "run this invocation". The
//! executor owns retry and fallback policy; adapters only classify what
//! went wrong.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::InstallInvocation;

/// Why an install invocation failed.
///
/// Each variant carries the package manager's stderr verbatim so it can be
/// copied into the report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstallError {
    /// Network trouble while fetching (connection reset, DNS, read timeout).
    #[error("transient fetch failure: {stderr}")]
    Transient { stderr: String },

    /// The attempt exceeded the per-step timeout.
    #[error("install timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Downloaded artifact failed a hash or signature check.
    #[error("integrity check failed: {stderr}")]
    Integrity { stderr: String },

    /// The source has no artifact matching the requirement and platform.
    #[error("no matching artifact: {stderr}")]
    NoMatchingArtifact { stderr: String },

    /// Any other non-zero exit.
    #[error("package manager exited with {}: {stderr}", exit_code.map_or_else(|| "signal".to_string(), |c| format!("code {c}")))]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The package manager could not be started.
    #[error("failed to launch package manager: {0}")]
    Launch(String),
}

impl InstallError {
    /// Network and timeout failures are worth retrying.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Timeout { .. })
    }

    /// Integrity failures are terminal for the package.
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }

    /// Whether the failure points at the artifact source rather than the
    /// package itself. Such failures allow a default-source fallback.
    pub const fn is_source_related(&self) -> bool {
        matches!(
            self,
            Self::NoMatchingArtifact { .. } | Self::Transient { .. } | Self::Timeout { .. }
        )
    }

    /// Text for the report entry.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Transient { stderr }
            | Self::Integrity { stderr }
            | Self::NoMatchingArtifact { stderr }
            | Self::Failed { stderr, .. } => stderr.clone(),
            Self::Timeout { .. } | Self::Launch(_) => self.to_string(),
        }
    }
}

/// Captured output of a successful install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Errors from read-only package-manager queries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PackageManagerError {
    #[error("failed to query installed version of {package}: {reason}")]
    Query { package: String, reason: String },
}

/// Port for the host package manager.
#[async_trait]
pub trait PackageManagerPort: Send + Sync {
    /// Currently installed version of `package`, or `None` if not installed.
    async fn installed_version(&self, package: &str)
    -> Result<Option<String>, PackageManagerError>;

    /// Run one install invocation.
    async fn install(&self, invocation: &InstallInvocation) -> Result<InstallOutput, InstallError>;
}
