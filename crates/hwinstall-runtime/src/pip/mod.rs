//! pip adapter for `PackageManagerPort`.
//!
//! Every call shells out to `<python> -m pip ...` so the packages land in
//! whatever environment that interpreter belongs to.

mod classify;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use hwinstall_core::{
    InstallError, InstallInvocation, InstallOutput, PackageManagerError, PackageManagerPort,
    SourceSelection,
};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

pub use classify::{classify_failure, is_not_installed, parse_show_version};

#[cfg(target_os = "windows")]
const PYTHON_CANDIDATES: &[&str] = &["python"];

#[cfg(not(target_os = "windows"))]
const PYTHON_CANDIDATES: &[&str] = &["python3", "python"];

/// Flags passed to every `pip install`.
const INSTALL_FLAGS: &[&str] = &["--disable-pip-version-check", "--no-input"];

/// Errors locating the Python interpreter.
#[derive(Error, Debug)]
pub enum PythonLookupError {
    #[error("Python not found in PATH (tried: {0})")]
    NotFound(String),

    #[error("Python interpreter {0} does not exist")]
    Missing(PathBuf),
}

/// Build the argument list for one install invocation.
pub fn install_args(invocation: &InstallInvocation) -> Vec<String> {
    let mut args: Vec<String> = ["-m", "pip", "install"]
        .iter()
        .chain(INSTALL_FLAGS)
        .map(ToString::to_string)
        .collect();
    args.push(invocation.requirement().to_string());

    match invocation.source() {
        SourceSelection::Default => {}
        SourceSelection::Replace { url, .. } => {
            args.push("--index-url".to_string());
            args.push(url.clone());
        }
        SourceSelection::Supplemental { url } => {
            args.push("--extra-index-url".to_string());
            args.push(url.clone());
        }
    }

    args
}

/// pip driven through a specific Python interpreter.
#[derive(Debug, Clone)]
pub struct PipPackageManager {
    python: PathBuf,
}

impl PipPackageManager {
    /// Use the first of `python3`/`python` found on `PATH`.
    pub fn discover() -> Result<Self, PythonLookupError> {
        PYTHON_CANDIDATES
            .iter()
            .find_map(|candidate| which::which(candidate).ok())
            .map(|python| {
                debug!(python = %python.display(), "Discovered Python interpreter");
                Self { python }
            })
            .ok_or_else(|| PythonLookupError::NotFound(PYTHON_CANDIDATES.join(", ")))
    }

    /// Use an explicit interpreter. Bare names are looked up on `PATH`.
    pub fn with_python(python: impl AsRef<Path>) -> Result<Self, PythonLookupError> {
        let python = python.as_ref();
        if python.exists() {
            return Ok(Self {
                python: python.to_path_buf(),
            });
        }
        which::which(python)
            .map(|python| Self { python })
            .map_err(|_| PythonLookupError::Missing(python.to_path_buf()))
    }

    pub fn python(&self) -> &Path {
        &self.python
    }
}

#[async_trait]
impl PackageManagerPort for PipPackageManager {
    async fn installed_version(
        &self,
        package: &str,
    ) -> Result<Option<String>, PackageManagerError> {
        let output = Command::new(&self.python)
            .args(["-m", "pip", "show", "--disable-pip-version-check", package])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| PackageManagerError::Query {
                package: package.to_string(),
                reason: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            return Ok(parse_show_version(&stdout));
        }
        if is_not_installed(&stderr) {
            return Ok(None);
        }

        Err(PackageManagerError::Query {
            package: package.to_string(),
            reason: format!("pip show exited with {}: {}", output.status, stderr.trim()),
        })
    }

    async fn install(&self, invocation: &InstallInvocation) -> Result<InstallOutput, InstallError> {
        let args = install_args(invocation);
        info!(python = %self.python.display(), "Running pip install {}", args[3..].join(" "));

        // Dropping the future (timeout, cancellation) must not leave pip running
        let output = Command::new(&self.python)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| InstallError::Launch(format!("{}: {e}", self.python.display())))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(InstallOutput { stdout, stderr })
        } else {
            Err(classify_failure(output.status.code(), &stdout, &stderr))
        }
    }
}
