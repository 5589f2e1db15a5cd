//! Core domain for hardware-aware native dependency installation.
//!
//! - [`domain`]: capabilities, version floors, package specs, invocations
//! - [`registry`]: the validated package table
//! - [`graph`]: the service dependency graph
//! - [`resolver`] and [`planner`]: component lookup and install ordering
//! - [`report`]: per-package execution outcomes
//! - [`ports`]: traits implemented by `hwinstall-runtime`
//!
//! Nothing here runs processes or touches the filesystem.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod errors;
pub mod graph;
pub mod planner;
pub mod ports;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    Component, ConstraintError, HardwareCapability, InstallInvocation, PackageSpec,
    ParseCapabilityError, ReleaseVersion, SatisfiedBy, SourceSelection, VersionFloor, WheelUrls,
};
pub use errors::{ConfigResult, ConfigurationError};
pub use graph::{ServiceGraph, ServiceGraphBuilder};
pub use planner::{InstallPlan, InstallPlanner, PlanStep};
pub use ports::{
    CacheError, DetectionError, HardwareProbePort, HostSignals, InstallError, InstallOutput,
    PackageManagerError, PackageManagerPort, VerifierPort, VersionCachePort, detect_with,
};
pub use registry::PackageRegistry;
pub use report::{
    ComponentOutcome, ComponentReport, InstallStatus, PackageReport, Report, StatusCounts,
};
pub use resolver::Resolver;
pub use settings::{ExecutorSettings, SettingsError, validate_settings};
