//! Hardware probe port.
//!
//! The probe gathers raw host signals; mapping signals to a single
//! [`HardwareCapability`] is pure policy and lives here so it can be
//! tested without touching the host.

use thiserror::Error;

use crate::domain::HardwareCapability;

/// Errors raised while probing. Never surfaced past the detector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectionError {
    /// A probe command could not be executed.
    #[error("probe command failed: {0}")]
    CommandFailed(String),

    /// The host platform is not recognised.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

/// Raw accelerator signals observed on a host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostSignals {
    /// macOS on Apple silicon.
    pub apple_silicon: bool,
    /// NVIDIA driver present (e.g., `nvidia-smi` lists a GPU).
    pub nvidia_gpu: bool,
    /// AMD ROCm stack present.
    pub rocm: bool,
}

impl HostSignals {
    /// Pick one capability. Priority: Metal > CUDA > ROCm > CPU.
    pub const fn capability(self) -> HardwareCapability {
        if self.apple_silicon {
            HardwareCapability::Metal
        } else if self.nvidia_gpu {
            HardwareCapability::Cuda
        } else if self.rocm {
            HardwareCapability::Rocm
        } else {
            HardwareCapability::Cpu
        }
    }
}

/// Port for host accelerator probing.
#[cfg_attr(test, mockall::automock)]
pub trait HardwareProbePort: Send + Sync {
    /// Collect accelerator signals from the host.
    fn probe(&self) -> Result<HostSignals, DetectionError>;
}

/// Detect the host capability through `probe`, degrading to CPU on error.
pub fn detect_with(probe: &dyn HardwareProbePort) -> HardwareCapability {
    match probe.probe() {
        Ok(signals) => {
            let capability = signals.capability();
            tracing::debug!(?signals, %capability, "Hardware capability detected");
            capability
        }
        Err(e) => {
            tracing::warn!(error = %e, "Hardware detection failed, assuming CPU");
            HardwareCapability::Cpu
        }
    }
}
