//! Post-install verification port.

use async_trait::async_trait;

use crate::domain::PackageSpec;

/// Optional smoke check run after a successful install.
///
/// A `false` result is advisory: it becomes a warning on the report entry
/// and never changes the package status.
#[async_trait]
pub trait VerifierPort: Send + Sync {
    /// `installed_version` is the version the executor refreshed right after
    /// the install, `None` when the package manager did not report one.
    async fn verify(
        &self,
        component: &str,
        package: &PackageSpec,
        installed_version: Option<&str>,
    ) -> bool;
}
