//! Execution report.
//!
//! A report enumerates every planned component and every resolved package
//! with exactly one terminal status.

use std::fmt;

use serde::Serialize;

use crate::domain::{HardwareCapability, SatisfiedBy};

/// Terminal status of one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    /// The package manager installed the package.
    Success,
    /// The install failed after the retry policy was exhausted.
    Failed,
    /// Not attempted: a dependency failed or the run was cancelled.
    Skipped,
    /// Not attempted: an installed version already meets the floor.
    SkippedAlreadySatisfied,
}

impl InstallStatus {
    /// Whether this status counts as a failure of the run.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Whether the package ended installed (either now or before).
    pub const fn is_satisfied(self) -> bool {
        matches!(self, Self::Success | Self::SkippedAlreadySatisfied)
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "installed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::SkippedAlreadySatisfied => "already satisfied",
        })
    }
}

/// Outcome for one (component, package) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    /// Package name.
    pub package: String,
    /// Requirement that was resolved, e.g. `torch>=2.0.0`.
    pub requirement: String,
    pub status: InstallStatus,
    /// Version found or installed, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
    /// Source that satisfied a successful install.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfied_by: Option<SatisfiedBy>,
    /// Number of install invocations made (0 when skipped).
    pub attempts: u32,
    /// Failure or skip explanation; package-manager stderr for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Advisory messages (e.g., failed post-install verification).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PackageReport {
    /// A package that was not attempted, with a reason.
    pub fn skipped(package: &str, requirement: &str, reason: impl Into<String>) -> Self {
        Self {
            package: package.to_string(),
            requirement: requirement.to_string(),
            status: InstallStatus::Skipped,
            installed_version: None,
            satisfied_by: None,
            attempts: 0,
            diagnostic: Some(reason.into()),
            warnings: Vec::new(),
        }
    }

    /// A package whose installed version already meets the floor.
    pub fn already_satisfied(package: &str, requirement: &str, version: String) -> Self {
        Self {
            package: package.to_string(),
            requirement: requirement.to_string(),
            status: InstallStatus::SkippedAlreadySatisfied,
            installed_version: Some(version),
            satisfied_by: None,
            attempts: 0,
            diagnostic: None,
            warnings: Vec::new(),
        }
    }
}

/// Overall outcome of a component step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentOutcome {
    /// Every package is installed or already satisfied (or there were none).
    Completed,
    /// At least one package failed; dependents are blocked.
    Failed,
    /// Not attempted.
    Skipped,
}

/// Outcome for one planned component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentReport {
    pub component: String,
    pub outcome: ComponentOutcome,
    pub packages: Vec<PackageReport>,
}

impl ComponentReport {
    /// Derive the outcome from package statuses.
    pub fn from_packages(component: impl Into<String>, packages: Vec<PackageReport>) -> Self {
        let outcome = if packages.iter().any(|p| p.status.is_failure()) {
            ComponentOutcome::Failed
        } else if !packages.is_empty()
            && packages.iter().all(|p| p.status == InstallStatus::Skipped)
        {
            ComponentOutcome::Skipped
        } else {
            ComponentOutcome::Completed
        };
        Self {
            component: component.into(),
            outcome,
            packages,
        }
    }

    /// A component whose step never started.
    pub fn skipped(component: impl Into<String>, packages: Vec<PackageReport>) -> Self {
        Self {
            component: component.into(),
            outcome: ComponentOutcome::Skipped,
            packages,
        }
    }
}

/// Per-status package counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub already_satisfied: usize,
}

/// Result of executing an install plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Capability the plan was executed for.
    pub hardware: HardwareCapability,
    /// Components in plan order.
    pub components: Vec<ComponentReport>,
    /// Whether cancellation stopped the run before every step started.
    pub cancelled: bool,
}

impl Report {
    /// Look up a component's report.
    pub fn component(&self, name: &str) -> Option<&ComponentReport> {
        self.components.iter().find(|c| c.component == name)
    }

    /// Look up a package's report within a component.
    pub fn package(&self, component: &str, package: &str) -> Option<&PackageReport> {
        self.component(component)?
            .packages
            .iter()
            .find(|p| p.package == package)
    }

    /// Iterate all `(component, package)` entries.
    pub fn packages(&self) -> impl Iterator<Item = (&str, &PackageReport)> {
        self.components.iter().flat_map(|c| {
            c.packages
                .iter()
                .map(move |p| (c.component.as_str(), p))
        })
    }

    /// The run failed if any package ended `Failed`.
    pub fn is_failed(&self) -> bool {
        self.packages().any(|(_, p)| p.status.is_failure())
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for (_, p) in self.packages() {
            match p.status {
                InstallStatus::Success => counts.success += 1,
                InstallStatus::Failed => counts.failed += 1,
                InstallStatus::Skipped => counts.skipped += 1,
                InstallStatus::SkippedAlreadySatisfied => counts.already_satisfied += 1,
            }
        }
        counts
    }

    /// Total install invocations across the run.
    pub fn total_attempts(&self) -> u32 {
        self.packages().map(|(_, p)| p.attempts).sum()
    }
}
