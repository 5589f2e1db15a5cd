//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from
//! infrastructure. They use only domain types; adapters live in
//! `hwinstall-runtime`.

pub mod hardware_probe;
pub mod package_manager;
pub mod verifier;
pub mod version_cache;

pub use hardware_probe::{DetectionError, HardwareProbePort, HostSignals, detect_with};
pub use package_manager::{InstallError, InstallOutput, PackageManagerError, PackageManagerPort};
pub use verifier::VerifierPort;
pub use version_cache::{CacheError, VersionCachePort};
