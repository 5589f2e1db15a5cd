//! Classification of pip output.
//!
//! pip reports every failure as a non-zero exit with free-form text, so the
//! failure kind is recovered from well-known message fragments. Matching is
//! case-insensitive and checked in order: integrity, build failure,
//! transient, then missing artifact.
//!
//! pip logs recovered network hiccups as `WARNING: Retrying ...` and keeps
//! going, so warning lines never decide a transient or missing-artifact
//! classification.

use hwinstall_core::InstallError;

const INTEGRITY_MARKERS: &[&str] = &[
    "do not match the hashes",
    "hash mismatch",
    "hashes are required",
    "checksum mismatch",
    "signature verification failed",
    "invalid signature",
];

/// The artifact was fetched but could not be built or installed.
const BUILD_FAILURE_MARKERS: &[&str] = &[
    "failed building wheel",
    "failed to build",
    "subprocess-exited-with-error",
    "could not build wheels",
];

const TRANSIENT_MARKERS: &[&str] = &[
    "connectionerror",
    "connection reset",
    "connection broken",
    "connection refused",
    "newconnectionerror",
    "read timed out",
    "readtimeouterror",
    "temporary failure in name resolution",
    "max retries exceeded",
    "incompleteread",
    "503 service unavailable",
    "502 bad gateway",
    "504 gateway time-out",
];

const NO_MATCH_MARKERS: &[&str] = &[
    "no matching distribution found",
    "could not find a version that satisfies the requirement",
];

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}

/// Output with pip's `WARNING:` lines removed.
fn without_warnings(output: &str) -> String {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("warning:"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classify a failed `pip install` from its exit code and output.
pub fn classify_failure(exit_code: Option<i32>, stdout: &str, stderr: &str) -> InstallError {
    let combined = format!("{stderr}\n{stdout}").to_lowercase();
    let decisive = without_warnings(&combined);
    let stderr = stderr.to_string();

    if contains_any(&combined, INTEGRITY_MARKERS) {
        InstallError::Integrity { stderr }
    } else if contains_any(&decisive, BUILD_FAILURE_MARKERS) {
        InstallError::Failed { exit_code, stderr }
    } else if contains_any(&decisive, TRANSIENT_MARKERS) {
        InstallError::Transient { stderr }
    } else if contains_any(&decisive, NO_MATCH_MARKERS) {
        InstallError::NoMatchingArtifact { stderr }
    } else {
        InstallError::Failed { exit_code, stderr }
    }
}

/// Extract the `Version:` field from `pip show` output.
pub fn parse_show_version(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        line.strip_prefix("Version:")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
    })
}

/// Whether `pip show` output means the package is simply not installed.
pub fn is_not_installed(stderr: &str) -> bool {
    stderr.to_lowercase().contains("package(s) not found")
}
