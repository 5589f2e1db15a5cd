//! Accelerator signal probes.

use std::path::Path;

use sysinfo::System;
use tracing::debug;

use super::commands::{command_stdout, command_succeeds, get_command_version};

/// Default ROCm install prefix on Linux.
const ROCM_PREFIX: &str = "/opt/rocm";

/// Whether this is macOS on Apple silicon.
///
/// An x86_64 build running under Rosetta still reports an Apple CPU brand,
/// so the brand is checked as well as the compile target.
pub fn is_apple_silicon() -> bool {
    if !cfg!(target_os = "macos") {
        return false;
    }
    if cfg!(target_arch = "aarch64") {
        return true;
    }

    let mut sys = System::new();
    sys.refresh_cpu_all();
    sys.cpus()
        .first()
        .is_some_and(|cpu| cpu.brand().starts_with("Apple"))
}

/// Detect if NVIDIA GPU hardware with a working driver is present.
pub fn detect_nvidia_hardware() -> bool {
    // nvidia-smi is the most reliable signal when the driver is installed
    if command_succeeds("nvidia-smi", &["--list-gpus"]) {
        return true;
    }

    #[cfg(target_os = "linux")]
    {
        if lspci_lists(&["nvidia"]) {
            debug!("NVIDIA device listed by lspci but nvidia-smi unavailable");
            return true;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(stdout) =
            command_stdout("wmic", &["path", "win32_VideoController", "get", "name"])
            && stdout.to_lowercase().contains("nvidia")
        {
            return true;
        }
    }

    false
}

/// Detect an AMD GPU with the ROCm stack installed.
pub fn detect_rocm() -> bool {
    if command_succeeds("rocminfo", &[]) {
        return true;
    }

    if let Some(version) = get_command_version("hipconfig", "--version") {
        debug!(hip_version = %version, "HIP toolchain found");
        return true;
    }

    // A ROCm install without a visible AMD device is not usable
    Path::new(ROCM_PREFIX).exists() && lspci_lists(&["amd/ati", "advanced micro devices"])
}

/// Whether `lspci` lists a display device matching any of `vendors`.
fn lspci_lists(vendors: &[&str]) -> bool {
    command_stdout("lspci", &[]).is_some_and(|stdout| {
        stdout.lines().any(|line| {
            let line = line.to_lowercase();
            let is_display =
                line.contains("vga") || line.contains("3d") || line.contains("display");
            is_display && vendors.iter().any(|v| line.contains(v))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apple_silicon_only_on_macos() {
        #[cfg(not(target_os = "macos"))]
        assert!(!is_apple_silicon());
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        assert!(is_apple_silicon());
    }

    #[test]
    fn test_probes_do_not_panic() {
        let _ = detect_nvidia_hardware();
        let _ = detect_rocm();
    }
}
