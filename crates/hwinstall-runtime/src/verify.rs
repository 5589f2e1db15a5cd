//! Post-install smoke checks.

use std::sync::Arc;

use async_trait::async_trait;
use hwinstall_core::{PackageManagerPort, PackageSpec, VerifierPort};
use tracing::{debug, warn};

/// Confirms the installed version meets the package's floor. The package
/// manager is only queried when the caller has no fresh version.
pub struct VersionSmokeCheck {
    package_manager: Arc<dyn PackageManagerPort>,
}

impl VersionSmokeCheck {
    pub fn new(package_manager: Arc<dyn PackageManagerPort>) -> Self {
        Self { package_manager }
    }
}

#[async_trait]
impl VerifierPort for VersionSmokeCheck {
    async fn verify(
        &self,
        component: &str,
        package: &PackageSpec,
        installed_version: Option<&str>,
    ) -> bool {
        let version = match installed_version {
            Some(version) => Ok(Some(version.to_string())),
            None => self.package_manager.installed_version(package.name()).await,
        };
        match version {
            Ok(Some(version)) if package.version().is_satisfied_by(&version) => {
                debug!(component, package = package.name(), %version, "Smoke check passed");
                true
            }
            Ok(Some(version)) => {
                warn!(
                    component,
                    package = package.name(),
                    %version,
                    floor = package.version().constraint(),
                    "Installed version below floor after install"
                );
                false
            }
            Ok(None) => {
                warn!(component, package = package.name(), "Package not visible after install");
                false
            }
            Err(e) => {
                warn!(component, error = %e, "Smoke check query failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use hwinstall_core::{
        HardwareCapability, InstallError, InstallInvocation, InstallOutput, PackageManagerError,
    };

    struct ReportsVersion(Option<&'static str>, AtomicUsize);

    impl ReportsVersion {
        fn new(version: Option<&'static str>) -> Self {
            Self(version, AtomicUsize::new(0))
        }
    }

    #[async_trait]
    impl PackageManagerPort for ReportsVersion {
        async fn installed_version(
            &self,
            _package: &str,
        ) -> Result<Option<String>, PackageManagerError> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.map(String::from))
        }

        async fn install(&self, _: &InstallInvocation) -> Result<InstallOutput, InstallError> {
            Ok(InstallOutput::default())
        }
    }

    fn spec() -> PackageSpec {
        let urls: BTreeMap<_, _> = HardwareCapability::ALL
            .iter()
            .map(|&hw| (hw, String::new()))
            .collect();
        PackageSpec::new("torch", ">=2.0.0", urls, false, false).unwrap()
    }

    #[tokio::test]
    async fn test_smoke_check_against_floor() {
        let ok = VersionSmokeCheck::new(Arc::new(ReportsVersion::new(Some("2.5.1"))));
        assert!(ok.verify("universal-runtime", &spec(), None).await);

        let old = VersionSmokeCheck::new(Arc::new(ReportsVersion::new(Some("1.13.0"))));
        assert!(!old.verify("universal-runtime", &spec(), None).await);

        let missing = VersionSmokeCheck::new(Arc::new(ReportsVersion::new(None)));
        assert!(!missing.verify("universal-runtime", &spec(), None).await);
    }

    #[tokio::test]
    async fn test_smoke_check_uses_supplied_version_without_query() {
        let pip = Arc::new(ReportsVersion::new(Some("1.13.0")));
        let check = VersionSmokeCheck::new(pip.clone());

        assert!(check.verify("universal-runtime", &spec(), Some("2.5.1+cu121")).await);
        assert!(!check.verify("universal-runtime", &spec(), Some("1.9.0")).await);
        assert_eq!(pip.1.load(Ordering::SeqCst), 0);

        assert!(!check.verify("universal-runtime", &spec(), None).await);
        assert_eq!(pip.1.load(Ordering::SeqCst), 1);
    }
}
