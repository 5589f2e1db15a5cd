//! Install command handler.

use std::sync::Arc;

use anyhow::{Context, Result};
use hwinstall_core::{ExecutorSettings, InstallPlanner, validate_settings};
use hwinstall_runtime::{Executor, FileVersionCache, PipPackageManager, VersionSmokeCheck};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::commands::InstallArgs;
use crate::presentation::{print_plan, print_report};

/// Map install flags onto executor settings; unset flags keep defaults.
pub fn settings_from_args(args: &InstallArgs) -> ExecutorSettings {
    ExecutorSettings {
        parallelism: args.parallelism,
        max_attempts: args.max_attempts,
        step_timeout_secs: args.step_timeout,
        ..ExecutorSettings::default()
    }
}

/// Plan and execute the install. Returns whether the run succeeded
/// (no failed package and not cancelled).
pub async fn execute(
    ctx: &CliContext,
    args: &InstallArgs,
    cancel: CancellationToken,
) -> Result<bool> {
    let settings = settings_from_args(args);
    validate_settings(&settings)?;

    let plan = InstallPlanner::new(&ctx.graph).plan(&args.components)?;

    if args.dry_run {
        print_plan(&plan, ctx.hardware);
        return Ok(true);
    }

    let pip = match &args.python {
        Some(python) => PipPackageManager::with_python(python)?,
        None => PipPackageManager::discover()
            .context("A Python interpreter is required; pass --python to choose one")?,
    };
    info!(python = %pip.python().display(), hardware = %ctx.hardware, "Installing");
    let pip = Arc::new(pip);

    let mut executor = Executor::new(pip.clone(), settings);
    if let Some(path) = &args.cache {
        executor = executor.with_cache(Arc::new(FileVersionCache::open(path)));
    }
    if !args.no_verify {
        executor = executor.with_verifier(Arc::new(VersionSmokeCheck::new(pip)));
    }

    let report = executor.execute(&plan, ctx.hardware, cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(!report.is_failed() && !report.cancelled)
}
