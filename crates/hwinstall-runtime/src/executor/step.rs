//! Per-component install pipeline.
//!
//! A worker receives a `PlanStep` (value type) and `StepDeps` (cloned Arcs)
//! and returns the component's report. It never sees scheduler state.

use std::sync::Arc;

use hwinstall_core::{
    ComponentReport, ExecutorSettings, HardwareCapability, InstallError, InstallInvocation,
    InstallOutput, InstallStatus, PackageManagerPort, PackageReport, PackageSpec, PlanStep,
    SatisfiedBy, VerifierPort, VersionCachePort,
};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Dependencies shared by every worker.
#[derive(Clone)]
pub struct StepDeps {
    pub package_manager: Arc<dyn PackageManagerPort>,
    pub cache: Option<Arc<dyn VersionCachePort>>,
    pub verifier: Option<Arc<dyn VerifierPort>>,
    pub settings: ExecutorSettings,
}

/// Install every package of `step`, in order. Siblings are independent: a
/// failed package does not stop the next one.
pub async fn run_step(
    step: PlanStep,
    hardware: HardwareCapability,
    deps: StepDeps,
) -> ComponentReport {
    info!(component = %step.component, packages = step.packages.len(), "Starting component");

    let mut packages = Vec::with_capacity(step.packages.len());
    for spec in &step.packages {
        packages.push(install_package(&step.component, spec, hardware, &deps).await);
    }

    let report = ComponentReport::from_packages(step.component, packages);
    info!(component = %report.component, outcome = ?report.outcome, "Component finished");
    report
}

async fn install_package(
    component: &str,
    spec: &PackageSpec,
    hardware: HardwareCapability,
    deps: &StepDeps,
) -> PackageReport {
    let requirement = spec.requirement();

    if let Some(version) = satisfied_version(spec, deps).await {
        info!(package = spec.name(), %version, "Already satisfied, skipping install");
        return PackageReport::already_satisfied(spec.name(), &requirement, version);
    }

    let invocation = spec.invocation(hardware);
    let mut report = PackageReport {
        package: spec.name().to_string(),
        requirement,
        status: InstallStatus::Failed,
        installed_version: None,
        satisfied_by: None,
        attempts: 0,
        diagnostic: None,
        warnings: Vec::new(),
    };

    let outcome = match install_with_retry(&invocation, deps, &mut report.attempts).await {
        Ok(output) => Ok(invocation.satisfied_by(&output.stdout)),
        Err(primary) => match fallback_for(&invocation, &primary) {
            Some(fallback) => {
                warn!(
                    package = spec.name(),
                    error = %primary,
                    "Capability source failed, falling back to default source"
                );
                report.warnings.push(format!(
                    "{invocation} failed, fell back to default source: {primary}"
                ));
                install_with_retry(&fallback, deps, &mut report.attempts)
                    .await
                    .map(|_| SatisfiedBy::DefaultFallback)
            }
            None => Err(primary),
        },
    };

    match outcome {
        Ok(satisfied_by) => {
            report.status = InstallStatus::Success;
            report.satisfied_by = Some(satisfied_by);
            finish_success(component, spec, deps, &mut report).await;
        }
        Err(err) => {
            warn!(
                package = spec.name(),
                attempts = report.attempts,
                error = %err,
                "Install failed"
            );
            report.diagnostic = Some(err.diagnostic());
        }
    }

    report
}

/// Installed version meeting the floor, from the cache or a direct query.
async fn satisfied_version(spec: &PackageSpec, deps: &StepDeps) -> Option<String> {
    if let Some(cache) = &deps.cache
        && let Some(version) = cache.get(spec.name())
        && spec.version().is_satisfied_by(&version)
    {
        debug!(package = spec.name(), %version, "Version cache hit");
        return Some(version);
    }

    match deps.package_manager.installed_version(spec.name()).await {
        Ok(Some(version)) if spec.version().is_satisfied_by(&version) => {
            record_version(deps, spec.name(), &version);
            Some(version)
        }
        Ok(Some(version)) => {
            debug!(
                package = spec.name(),
                %version,
                floor = spec.version().constraint(),
                "Installed version below floor"
            );
            None
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Installed version query failed, installing anyway");
            None
        }
    }
}

/// Default-source retry, only for source-related failures of a replacing
/// source that allows it.
fn fallback_for(
    invocation: &InstallInvocation,
    error: &InstallError,
) -> Option<InstallInvocation> {
    if error.is_integrity() || !error.is_source_related() {
        return None;
    }
    invocation.default_source_fallback()
}

/// Run one invocation under the retry policy. Every attempt is counted in
/// `attempts`; only transient failures are retried.
async fn install_with_retry(
    invocation: &InstallInvocation,
    deps: &StepDeps,
    attempts: &mut u32,
) -> Result<InstallOutput, InstallError> {
    let max_attempts = deps.settings.effective_max_attempts();
    let step_timeout = deps.settings.step_timeout();
    let mut retry = 0;

    loop {
        *attempts += 1;
        debug!(%invocation, attempt = retry + 1, "Installing");

        let result = timeout(step_timeout, deps.package_manager.install(invocation))
            .await
            .unwrap_or(Err(InstallError::Timeout {
                secs: step_timeout.as_secs(),
            }));

        match result {
            Ok(output) => return Ok(output),
            Err(err) if err.is_transient() && retry + 1 < max_attempts => {
                retry += 1;
                let delay = deps.settings.backoff_for(retry);
                warn!(
                    package = invocation.package(),
                    error = %err,
                    retry,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Transient install failure, retrying"
                );
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn finish_success(
    component: &str,
    spec: &PackageSpec,
    deps: &StepDeps,
    report: &mut PackageReport,
) {
    match deps.package_manager.installed_version(spec.name()).await {
        Ok(Some(version)) => {
            record_version(deps, spec.name(), &version);
            report.installed_version = Some(version);
        }
        Ok(None) => debug!(package = spec.name(), "Installed version not reported after install"),
        Err(e) => warn!(error = %e, "Could not refresh installed version"),
    }

    if let Some(verifier) = &deps.verifier
        && !verifier
            .verify(component, spec, report.installed_version.as_deref())
            .await
    {
        warn!(component, package = spec.name(), "Post-install verification failed");
        report
            .warnings
            .push(format!("post-install verification failed for {}", spec.requirement()));
    }

    info!(
        package = spec.name(),
        version = report.installed_version.as_deref().unwrap_or("unknown"),
        attempts = report.attempts,
        "Installed"
    );
}

fn record_version(deps: &StepDeps, package: &str, version: &str) {
    if let Some(cache) = &deps.cache
        && let Err(e) = cache.record(package, version)
    {
        warn!(error = %e, "Failed to update version cache");
    }
}
