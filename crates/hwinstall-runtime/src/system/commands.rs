//! Probe command helpers.
//!
//! Every helper swallows spawn errors: a missing tool is simply an absent
//! signal. The caller decides whether absence matters.

use std::process::Command;

use tracing::trace;

/// Run `cmd args...` and report whether it exited successfully.
pub fn command_succeeds(cmd: &str, args: &[&str]) -> bool {
    match Command::new(cmd).args(args).output() {
        Ok(output) => output.status.success(),
        Err(e) => {
            trace!(command = cmd, error = %e, "Probe command unavailable");
            false
        }
    }
}

/// Stdout of `cmd args...` when it exits successfully.
pub fn command_stdout(cmd: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(cmd).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// First line of `cmd --version`-style output, trying stdout then stderr.
pub fn get_command_version(cmd: &str, version_flag: &str) -> Option<String> {
    let output = Command::new(cmd).arg(version_flag).output().ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    // Some tools print their version on stderr
    let text = if stdout.trim().is_empty() {
        stderr
    } else {
        stdout
    };

    text.lines().next().map(|s| s.trim().to_string())
}
