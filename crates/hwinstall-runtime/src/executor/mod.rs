//! Install plan execution.
//!
//! The scheduler walks the plan in order and starts a component once every
//! dependency is terminal, keeping at most `parallelism` components in
//! flight. Workers report back through the `JoinSet`; only `execute`
//! assembles the report.

mod step;

use std::collections::HashMap;
use std::sync::Arc;

use hwinstall_core::{
    ComponentOutcome, ComponentReport, ExecutorSettings, HardwareCapability, InstallPlan,
    PackageManagerPort, PackageReport, PlanStep, Report, VerifierPort, VersionCachePort,
};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use step::{StepDeps, run_step};

/// Errors that abort execution as a whole.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Invalid plan: component '{0}' appears more than once")]
    DuplicateStep(String),

    #[error("Invalid plan: '{component}' depends on '{dependency}', which is not planned before it")]
    UnorderedDependency {
        component: String,
        dependency: String,
    },

    #[error("Install worker panicked: {0}")]
    WorkerPanicked(String),
}

/// Runs install plans against a package manager.
pub struct Executor {
    deps: StepDeps,
}

impl Executor {
    pub fn new(package_manager: Arc<dyn PackageManagerPort>, settings: ExecutorSettings) -> Self {
        Self {
            deps: StepDeps {
                package_manager,
                cache: None,
                verifier: None,
                settings,
            },
        }
    }

    /// Consult and refresh `cache` around installs.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn VersionCachePort>) -> Self {
        self.deps.cache = Some(cache);
        self
    }

    /// Run `verifier` after every successful install.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn VerifierPort>) -> Self {
        self.deps.verifier = Some(verifier);
        self
    }

    pub const fn settings(&self) -> &ExecutorSettings {
        &self.deps.settings
    }

    /// Execute `plan` for `hardware`.
    ///
    /// Cancelling `cancel` lets in-flight components finish and reports
    /// every unstarted component as skipped.
    pub async fn execute(
        &self,
        plan: &InstallPlan,
        hardware: HardwareCapability,
        cancel: CancellationToken,
    ) -> Result<Report, ExecuteError> {
        let steps = plan.steps();
        let dependencies = dependency_indices(steps)?;
        let parallelism = self.deps.settings.effective_parallelism();

        info!(
            %hardware,
            components = steps.len(),
            packages = plan.package_count(),
            parallelism,
            "Executing install plan"
        );

        let mut reports: Vec<Option<ComponentReport>> = vec![None; steps.len()];
        let mut started = vec![false; steps.len()];
        let mut workers = JoinSet::new();

        loop {
            if !cancel.is_cancelled() {
                for (index, step) in steps.iter().enumerate() {
                    if workers.len() >= parallelism {
                        break;
                    }
                    if started[index] {
                        continue;
                    }

                    let mut blocked = None;
                    let mut ready = true;
                    for &dep in &dependencies[index] {
                        match &reports[dep] {
                            None => ready = false,
                            Some(report) if report.outcome != ComponentOutcome::Completed => {
                                blocked.get_or_insert(report);
                            }
                            Some(_) => {}
                        }
                    }
                    if !ready {
                        continue;
                    }

                    started[index] = true;
                    if let Some(dep) = blocked {
                        let reason = blocked_reason(dep);
                        warn!(component = %step.component, "{reason}");
                        reports[index] = Some(skipped_component(step, &reason));
                        continue;
                    }

                    let deps = self.deps.clone();
                    let step = step.clone();
                    workers.spawn(async move { (index, run_step(step, hardware, deps).await) });
                }
            }

            match workers.join_next().await {
                Some(Ok((index, report))) => reports[index] = Some(report),
                Some(Err(e)) => {
                    error!(error = %e, "Install worker failed");
                    workers.abort_all();
                    return Err(ExecuteError::WorkerPanicked(e.to_string()));
                }
                None => break,
            }
        }

        let cancelled = started.iter().any(|s| !s);
        let components = steps
            .iter()
            .zip(reports)
            .map(|(step, report)| {
                report.unwrap_or_else(|| {
                    skipped_component(step, "installation cancelled before this component started")
                })
            })
            .collect();

        let report = Report {
            hardware,
            components,
            cancelled,
        };

        let counts = report.counts();
        info!(
            installed = counts.success,
            already_satisfied = counts.already_satisfied,
            failed = counts.failed,
            skipped = counts.skipped,
            cancelled,
            "Install plan finished"
        );

        Ok(report)
    }
}

/// Resolve every step's dependencies to earlier plan positions.
fn dependency_indices(steps: &[PlanStep]) -> Result<Vec<Vec<usize>>, ExecuteError> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
    let mut indices = Vec::with_capacity(steps.len());

    for (index, step) in steps.iter().enumerate() {
        let deps = step
            .depends_on
            .iter()
            .map(|dep| {
                positions
                    .get(dep.as_str())
                    .copied()
                    .ok_or_else(|| ExecuteError::UnorderedDependency {
                        component: step.component.clone(),
                        dependency: dep.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        indices.push(deps);

        if positions.insert(&step.component, index).is_some() {
            return Err(ExecuteError::DuplicateStep(step.component.clone()));
        }
    }

    Ok(indices)
}

fn blocked_reason(dependency: &ComponentReport) -> String {
    match dependency.outcome {
        ComponentOutcome::Failed => {
            format!("dependency '{}' failed", dependency.component)
        }
        _ => format!("dependency '{}' was skipped", dependency.component),
    }
}

fn skipped_component(step: &PlanStep, reason: &str) -> ComponentReport {
    let packages = step
        .packages
        .iter()
        .map(|spec| PackageReport::skipped(spec.name(), &spec.requirement(), reason))
        .collect();
    ComponentReport::skipped(&step.component, packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(name: &str, deps: &[&str]) -> PlanStep {
        PlanStep {
            component: name.to_string(),
            packages: Vec::new(),
            depends_on: deps.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_dependency_indices() {
        let steps = vec![step("a", &[]), step("b", &["a"]), step("c", &["a", "b"])];
        let indices = dependency_indices(&steps).unwrap();
        assert_eq!(indices, vec![vec![], vec![0], vec![0, 1]]);
    }

    #[test]
    fn test_dependency_after_dependent_is_rejected() {
        let steps = vec![step("b", &["a"]), step("a", &[])];
        let err = dependency_indices(&steps).unwrap_err();
        assert!(matches!(
            err,
            ExecuteError::UnorderedDependency { ref component, ref dependency }
                if component == "b" && dependency == "a"
        ));
    }

    #[test]
    fn test_duplicate_step_is_rejected() {
        let steps = vec![step("a", &[]), step("a", &[])];
        assert!(matches!(
            dependency_indices(&steps),
            Err(ExecuteError::DuplicateStep(name)) if name == "a"
        ));
    }

    #[test]
    fn test_blocked_reason_names_dependency() {
        let failed = ComponentReport {
            component: "rag".to_string(),
            outcome: ComponentOutcome::Failed,
            packages: Vec::new(),
        };
        assert_eq!(blocked_reason(&failed), "dependency 'rag' failed");
    }
}
