//! Executor behaviour against a scripted package manager.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hwinstall_core::{
    ComponentOutcome, ExecutorSettings, HardwareCapability, InstallError, InstallInvocation,
    InstallOutput, InstallPlan, InstallPlanner, InstallStatus, PackageManagerError,
    PackageManagerPort, PackageRegistry, PackageSpec, PlanStep, Report, SatisfiedBy,
    ServiceGraph, SourceSelection, VerifierPort,
};
use hwinstall_runtime::{ExecuteError, Executor, InMemoryVersionCache, VersionSmokeCheck};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fake package manager
// ============================================================================

enum Behavior {
    Fail(InstallError),
    Hang,
    Delay(Duration),
}

#[derive(Default)]
struct FakePip {
    installed: Mutex<HashMap<String, String>>,
    scripted: Mutex<HashMap<String, VecDeque<Behavior>>>,
    calls: Mutex<Vec<InstallInvocation>>,
    queries: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    cancel_on_install: Option<CancellationToken>,
}

impl FakePip {
    fn new() -> Self {
        Self::default()
    }

    fn with_installed(self, package: &str, version: &str) -> Self {
        self.installed
            .lock()
            .unwrap()
            .insert(package.to_string(), version.to_string());
        self
    }

    fn script(self, package: &str, behaviors: impl IntoIterator<Item = Behavior>) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .entry(package.to_string())
            .or_default()
            .extend(behaviors);
        self
    }

    fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_install = Some(token);
        self
    }

    fn calls(&self) -> Vec<InstallInvocation> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_for(&self, package: &str) -> Vec<InstallInvocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.package() == package)
            .collect()
    }
}

#[async_trait]
impl PackageManagerPort for FakePip {
    async fn installed_version(
        &self,
        package: &str,
    ) -> Result<Option<String>, PackageManagerError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.installed.lock().unwrap().get(package).cloned())
    }

    async fn install(&self, invocation: &InstallInvocation) -> Result<InstallOutput, InstallError> {
        self.calls.lock().unwrap().push(invocation.clone());
        if let Some(token) = &self.cancel_on_install {
            token.cancel();
        }

        let behavior = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(invocation.package())
            .and_then(VecDeque::pop_front);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = match behavior {
            Some(Behavior::Fail(err)) => Err(err),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
                Err(InstallError::Launch("hang finished".to_string()))
            }
            Some(Behavior::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Ok(()),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result.map(|()| {
            self.installed
                .lock()
                .unwrap()
                .insert(invocation.package().to_string(), "99.0.0".to_string());
            let package = invocation.package();
            // Extra indexes link wheels hosted on release pages, not under the index URL
            let stdout = match invocation.source() {
                SourceSelection::Supplemental { url } => format!(
                    "Looking in indexes: https://pypi.org/simple, {url}\n\
                     Downloading https://github.com/example/{package}/releases/download/v99.0.0/{package}-99.0.0-cp311-cp311-linux_x86_64.whl (12.0 MB)"
                ),
                SourceSelection::Replace { url, .. } => format!(
                    "Looking in indexes: {url}\nDownloading {url}/{package}-99.0.0-cp311-cp311-linux_x86_64.whl (12.0 MB)"
                ),
                SourceSelection::Default => format!(
                    "Downloading https://files.pythonhosted.org/packages/ab/cd/{package}-99.0.0.tar.gz (1.2 MB)"
                ),
            };
            InstallOutput {
                stdout,
                stderr: String::new(),
            }
        })
    }
}

struct RejectingVerifier;

#[async_trait]
impl VerifierPort for RejectingVerifier {
    async fn verify(
        &self,
        _component: &str,
        _package: &PackageSpec,
        _installed_version: Option<&str>,
    ) -> bool {
        false
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn fast_settings() -> ExecutorSettings {
    ExecutorSettings {
        parallelism: Some(2),
        max_attempts: Some(3),
        backoff_base_ms: Some(10),
        backoff_max_ms: Some(40),
        step_timeout_secs: Some(5),
    }
}

fn builtin_plan(components: &[&str]) -> InstallPlan {
    let registry = PackageRegistry::builtin().unwrap();
    let graph = ServiceGraph::builtin(&registry).unwrap();
    InstallPlanner::new(&graph).plan(components).unwrap()
}

async fn run(pip: &Arc<FakePip>, plan: &InstallPlan, hw: HardwareCapability) -> Report {
    Executor::new(pip.clone(), fast_settings())
        .execute(plan, hw, CancellationToken::new())
        .await
        .unwrap()
}

fn transient() -> Behavior {
    Behavior::Fail(InstallError::Transient {
        stderr: "Connection reset by peer".to_string(),
    })
}

// ============================================================================
// Source selection scenarios
// ============================================================================

#[tokio::test]
async fn test_cuda_scenario_uses_default_torch_and_cuda_llama_index() {
    let pip = Arc::new(FakePip::new());
    let report = run(&pip, &builtin_plan(&["server"]), HardwareCapability::Cuda).await;

    let torch = pip.calls_for("torch");
    assert_eq!(torch.len(), 1);
    assert_eq!(torch[0].source(), &SourceSelection::Default);

    let llama = pip.calls_for("llama-cpp-python");
    assert_eq!(llama.len(), 1);
    assert_eq!(
        llama[0].source(),
        &SourceSelection::Supplemental {
            url: "https://abetlen.github.io/llama-cpp-python/whl/cu121".to_string()
        }
    );

    assert!(!report.is_failed());
    let torch = report.package("universal-runtime", "torch").unwrap();
    assert_eq!(torch.status, InstallStatus::Success);
    assert_eq!(torch.satisfied_by, Some(SatisfiedBy::DefaultSource));
    assert_eq!(torch.installed_version.as_deref(), Some("99.0.0"));
    assert_eq!(
        report
            .package("universal-runtime", "llama-cpp-python")
            .unwrap()
            .satisfied_by,
        Some(SatisfiedBy::SupplementalSource)
    );

    // Package-less components complete trivially
    assert_eq!(report.component("rag").unwrap().outcome, ComponentOutcome::Completed);
    assert_eq!(report.component("server").unwrap().outcome, ComponentOutcome::Completed);
}

#[tokio::test]
async fn test_cpu_scenario_replaces_torch_index_and_adds_llama_index() {
    let pip = Arc::new(FakePip::new());
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Cpu).await;

    let torch = pip.calls_for("torch");
    assert_eq!(
        torch[0].source(),
        &SourceSelection::Replace {
            url: "https://download.pytorch.org/whl/cpu".to_string(),
            fallback_to_default: true,
        }
    );
    let llama = pip.calls_for("llama-cpp-python");
    assert_eq!(
        llama[0].source(),
        &SourceSelection::Supplemental {
            url: "https://abetlen.github.io/llama-cpp-python/whl/cpu".to_string()
        }
    );

    assert_eq!(
        report.package("universal-runtime", "torch").unwrap().satisfied_by,
        Some(SatisfiedBy::ReplacementSource)
    );
}

// ============================================================================
// Idempotency
// ============================================================================

#[tokio::test]
async fn test_second_run_is_all_already_satisfied() {
    let pip = Arc::new(FakePip::new());
    let cache = Arc::new(InMemoryVersionCache::new());
    let executor = Executor::new(pip.clone(), fast_settings()).with_cache(cache);
    let plan = builtin_plan(&["server"]);

    let first = executor
        .execute(&plan, HardwareCapability::Metal, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.counts().success, 2);
    let installs_after_first = pip.calls().len();
    let queries_after_first = pip.queries.load(Ordering::SeqCst);

    let second = executor
        .execute(&plan, HardwareCapability::Metal, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(pip.calls().len(), installs_after_first);
    // Cache hits avoid package-manager queries entirely
    assert_eq!(pip.queries.load(Ordering::SeqCst), queries_after_first);
    assert!(second
        .packages()
        .all(|(_, p)| p.status == InstallStatus::SkippedAlreadySatisfied && p.attempts == 0));
    assert_eq!(second.total_attempts(), 0);
}

#[tokio::test]
async fn test_installed_version_decides_skip_against_floor() {
    let pip = Arc::new(
        FakePip::new()
            .with_installed("torch", "2.5.1+cu121")
            .with_installed("llama-cpp-python", "0.2.90"),
    );
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Cuda).await;

    let torch = report.package("universal-runtime", "torch").unwrap();
    assert_eq!(torch.status, InstallStatus::SkippedAlreadySatisfied);
    assert_eq!(torch.installed_version.as_deref(), Some("2.5.1+cu121"));

    // Below the >=0.3.0 floor, so it is installed
    let llama = report.package("universal-runtime", "llama-cpp-python").unwrap();
    assert_eq!(llama.status, InstallStatus::Success);
    assert_eq!(pip.calls().len(), 1);
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_integrity_failure_blocks_dependents_without_fallback() {
    let registry = PackageRegistry::builtin().unwrap();
    let graph = ServiceGraph::builder(&registry)
        .component("app", &["llama-cpp-python"], &["base"])
        .component("base", &["torch"], &[])
        .component("frontend", &[], &["app"])
        .build()
        .unwrap();
    let plan = InstallPlanner::new(&graph).plan(&["frontend"]).unwrap();

    let stderr = "ERROR: THESE PACKAGES DO NOT MATCH THE HASHES FROM THE REQUIREMENTS FILE.";
    let pip = Arc::new(FakePip::new().script(
        "torch",
        [Behavior::Fail(InstallError::Integrity {
            stderr: stderr.to_string(),
        })],
    ));
    let report = run(&pip, &plan, HardwareCapability::Cpu).await;

    // The CPU torch source allows fallback, but integrity failures never use it
    assert_eq!(pip.calls_for("torch").len(), 1);
    assert!(pip.calls_for("llama-cpp-python").is_empty());

    let torch = report.package("base", "torch").unwrap();
    assert_eq!(torch.status, InstallStatus::Failed);
    assert_eq!(torch.diagnostic.as_deref(), Some(stderr));

    let llama = report.package("app", "llama-cpp-python").unwrap();
    assert_eq!(llama.status, InstallStatus::Skipped);
    assert!(llama.diagnostic.as_deref().unwrap().contains("'base'"));
    assert_eq!(report.component("app").unwrap().outcome, ComponentOutcome::Skipped);
    assert_eq!(report.component("frontend").unwrap().outcome, ComponentOutcome::Skipped);
    assert!(report.is_failed());
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_consume_retry_budget() {
    let pip = Arc::new(FakePip::new().script("torch", [transient(), transient(), transient()]));
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Cuda).await;

    let torch = report.package("universal-runtime", "torch").unwrap();
    assert_eq!(torch.status, InstallStatus::Failed);
    assert_eq!(torch.attempts, 3);
    assert_eq!(torch.diagnostic.as_deref(), Some("Connection reset by peer"));
    assert_eq!(pip.calls_for("torch").len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_then_success() {
    let pip = Arc::new(FakePip::new().script("torch", [transient(), transient()]));
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Cuda).await;

    let torch = report.package("universal-runtime", "torch").unwrap();
    assert_eq!(torch.status, InstallStatus::Success);
    assert_eq!(torch.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried_as_transient() {
    let pip = Arc::new(FakePip::new().script("llama-cpp-python", [Behavior::Hang]));
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Cuda).await;

    let llama = report.package("universal-runtime", "llama-cpp-python").unwrap();
    assert_eq!(llama.status, InstallStatus::Success);
    assert_eq!(llama.attempts, 2);
}

#[tokio::test]
async fn test_missing_artifact_falls_back_to_default_source() {
    let pip = Arc::new(FakePip::new().script(
        "torch",
        [Behavior::Fail(InstallError::NoMatchingArtifact {
            stderr: "ERROR: No matching distribution found for torch>=2.0.0".to_string(),
        })],
    ));
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Rocm).await;

    let calls = pip.calls_for("torch");
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0].source(), SourceSelection::Replace { .. }));
    assert_eq!(calls[1].source(), &SourceSelection::Default);

    let torch = report.package("universal-runtime", "torch").unwrap();
    assert_eq!(torch.status, InstallStatus::Success);
    assert_eq!(torch.satisfied_by, Some(SatisfiedBy::DefaultFallback));
    assert_eq!(torch.attempts, 2);
    assert_eq!(torch.warnings.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_transient_retries_fall_back_to_default_source() {
    let pip = Arc::new(FakePip::new().script("torch", [transient(), transient(), transient()]));
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Cpu).await;

    let calls = pip.calls_for("torch");
    assert_eq!(calls.len(), 4);
    assert!(calls[..3]
        .iter()
        .all(|c| matches!(c.source(), SourceSelection::Replace { .. })));
    assert_eq!(calls[3].source(), &SourceSelection::Default);

    let torch = report.package("universal-runtime", "torch").unwrap();
    assert_eq!(torch.status, InstallStatus::Success);
    assert_eq!(torch.satisfied_by, Some(SatisfiedBy::DefaultFallback));
    assert_eq!(torch.attempts, 4);
    assert_eq!(torch.warnings.len(), 1);
    assert!(torch.warnings[0].contains("Connection reset by peer"));
    assert!(torch.diagnostic.is_none());
}

#[tokio::test]
async fn test_supplemental_source_has_no_fallback() {
    let pip = Arc::new(FakePip::new().script(
        "llama-cpp-python",
        [Behavior::Fail(InstallError::NoMatchingArtifact {
            stderr: "ERROR: No matching distribution found".to_string(),
        })],
    ));
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Cuda).await;

    assert_eq!(pip.calls_for("llama-cpp-python").len(), 1);
    let llama = report.package("universal-runtime", "llama-cpp-python").unwrap();
    assert_eq!(llama.status, InstallStatus::Failed);
}

#[tokio::test]
async fn test_sibling_packages_are_independent() {
    let pip = Arc::new(FakePip::new().script(
        "torch",
        [Behavior::Fail(InstallError::Failed {
            exit_code: Some(1),
            stderr: "error: subprocess-exited-with-error".to_string(),
        })],
    ));
    let report = run(&pip, &builtin_plan(&["universal-runtime"]), HardwareCapability::Cuda).await;

    assert_eq!(
        report.package("universal-runtime", "torch").unwrap().status,
        InstallStatus::Failed
    );
    assert_eq!(
        report
            .package("universal-runtime", "llama-cpp-python")
            .unwrap()
            .status,
        InstallStatus::Success
    );
    assert_eq!(
        report.component("universal-runtime").unwrap().outcome,
        ComponentOutcome::Failed
    );
}

#[tokio::test]
async fn test_verifier_failure_is_only_a_warning() {
    let pip = Arc::new(FakePip::new());
    let report = Executor::new(pip.clone(), fast_settings())
        .with_verifier(Arc::new(RejectingVerifier))
        .execute(
            &builtin_plan(&["universal-runtime"]),
            HardwareCapability::Cuda,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(!report.is_failed());
    for (_, package) in report.packages() {
        assert_eq!(package.status, InstallStatus::Success);
        assert_eq!(package.warnings.len(), 1);
    }
}

#[tokio::test]
async fn test_smoke_check_reuses_refreshed_version() {
    let pip = Arc::new(FakePip::new());
    let report = Executor::new(pip.clone(), fast_settings())
        .with_verifier(Arc::new(VersionSmokeCheck::new(pip.clone())))
        .execute(
            &builtin_plan(&["universal-runtime"]),
            HardwareCapability::Cuda,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.counts().success, 2);
    assert!(report.packages().all(|(_, p)| p.warnings.is_empty()));
    // One pre-install check and one refresh per package, none from the smoke check
    assert_eq!(pip.queries.load(Ordering::SeqCst), 4);
}

// ============================================================================
// Scheduling and cancellation
// ============================================================================

fn independent_plan(count: usize) -> (InstallPlan, Vec<String>) {
    let names: Vec<String> = (0..count).map(|i| format!("pkg-{i}")).collect();
    let specs = names.iter().map(|name| {
        let urls = HardwareCapability::ALL
            .into_iter()
            .map(|hw| (hw, String::new()))
            .collect::<BTreeMap<_, _>>();
        PackageSpec::new(name.as_str(), ">=1.0", urls, false, false).unwrap()
    });
    let registry = PackageRegistry::new(specs).unwrap();

    let mut builder = ServiceGraph::builder(&registry);
    let components: Vec<String> = (0..count).map(|i| format!("svc-{i}")).collect();
    for (component, package) in components.iter().zip(&names) {
        builder = builder.component(component, &[package.as_str()], &[]);
    }
    let graph = builder.build().unwrap();
    let plan = InstallPlanner::new(&graph).plan(&components).unwrap();
    (plan, names)
}

#[tokio::test(start_paused = true)]
async fn test_parallelism_bounds_concurrent_components() {
    let (plan, names) = independent_plan(5);
    let mut pip = FakePip::new();
    for name in &names {
        pip = pip.script(name, [Behavior::Delay(Duration::from_secs(1))]);
    }
    let pip = Arc::new(pip);

    let report = run(&pip, &plan, HardwareCapability::Cpu).await;

    assert_eq!(report.counts().success, 5);
    assert_eq!(pip.max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancelled_before_start_skips_everything() {
    let pip = Arc::new(FakePip::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Executor::new(pip.clone(), fast_settings())
        .execute(&builtin_plan(&["server"]), HardwareCapability::Cuda, cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(pip.calls().is_empty());
    assert_eq!(report.components.len(), 3);
    assert!(report
        .components
        .iter()
        .all(|c| c.outcome == ComponentOutcome::Skipped));
    assert!(report.packages().all(|(_, p)| p.status == InstallStatus::Skipped));
    assert!(!report.is_failed());
}

#[tokio::test]
async fn test_cancellation_lets_in_flight_step_finish() {
    let cancel = CancellationToken::new();
    let (plan, _) = independent_plan(3);
    let pip = Arc::new(FakePip::new().cancelling(cancel.clone()));

    let settings = ExecutorSettings {
        parallelism: Some(1),
        ..fast_settings()
    };
    let report = Executor::new(pip.clone(), settings)
        .execute(&plan, HardwareCapability::Cpu, cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(pip.calls().len(), 1);
    assert_eq!(report.components[0].outcome, ComponentOutcome::Completed);
    for component in &report.components[1..] {
        assert_eq!(component.outcome, ComponentOutcome::Skipped);
        assert!(component.packages[0]
            .diagnostic
            .as_deref()
            .unwrap()
            .contains("cancelled"));
    }
}

#[tokio::test]
async fn test_misordered_plan_is_rejected() {
    let plan = InstallPlan::from_steps(vec![
        PlanStep {
            component: "server".to_string(),
            packages: Vec::new(),
            depends_on: vec!["rag".to_string()],
        },
        PlanStep {
            component: "rag".to_string(),
            packages: Vec::new(),
            depends_on: Vec::new(),
        },
    ]);

    let pip = Arc::new(FakePip::new());
    let err = Executor::new(pip, fast_settings())
        .execute(&plan, HardwareCapability::Cpu, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::UnorderedDependency { .. }));
}
