//! Hardware detection for hwinstall-runtime.
//!
//! [`HostHardwareProbe`] implements `HardwareProbePort` by running probe
//! commands on the host. [`HardwareDetector`] turns probe results into a
//! single capability and never fails: any probing problem means CPU.

mod commands;
mod gpu;

use hwinstall_core::ports::{DetectionError, HardwareProbePort, HostSignals, detect_with};
use hwinstall_core::HardwareCapability;

use gpu::{detect_nvidia_hardware, detect_rocm, is_apple_silicon};

/// Probe backed by host commands (`nvidia-smi`, `lspci`, `rocminfo`).
#[derive(Debug, Default, Clone, Copy)]
pub struct HostHardwareProbe;

impl HostHardwareProbe {
    pub const fn new() -> Self {
        Self
    }
}

impl HardwareProbePort for HostHardwareProbe {
    fn probe(&self) -> Result<HostSignals, DetectionError> {
        if !cfg!(any(target_os = "linux", target_os = "macos", target_os = "windows")) {
            return Err(DetectionError::UnsupportedPlatform(
                std::env::consts::OS.to_string(),
            ));
        }

        let apple_silicon = is_apple_silicon();
        // Apple hosts have no discrete GPU stacks worth probing
        if apple_silicon {
            return Ok(HostSignals {
                apple_silicon,
                ..HostSignals::default()
            });
        }

        Ok(HostSignals {
            apple_silicon,
            nvidia_gpu: detect_nvidia_hardware(),
            rocm: detect_rocm(),
        })
    }
}

/// Detects the host's [`HardwareCapability`].
pub struct HardwareDetector {
    probe: Box<dyn HardwareProbePort>,
}

impl HardwareDetector {
    /// Detector over the real host.
    pub fn new() -> Self {
        Self::with_probe(Box::new(HostHardwareProbe::new()))
    }

    /// Detector over a custom probe.
    pub fn with_probe(probe: Box<dyn HardwareProbePort>) -> Self {
        Self { probe }
    }

    /// Detect the capability, degrading to CPU if probing fails.
    pub fn detect(&self) -> HardwareCapability {
        detect_with(self.probe.as_ref())
    }
}

impl Default for HardwareDetector {
    fn default() -> Self {
        Self::new()
    }
}
