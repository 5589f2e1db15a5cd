//! Hardware acceleration capability of a host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accelerator class detected on a host.
///
/// Exactly one value describes a host at any time. The set is closed:
/// every per-capability table in the registry must carry an entry for
/// each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareCapability {
    /// CPU only (no acceleration)
    Cpu,
    /// NVIDIA GPU with CUDA drivers
    Cuda,
    /// Apple integrated GPU (Apple Silicon)
    Metal,
    /// AMD GPU with the ROCm stack
    Rocm,
}

impl HardwareCapability {
    /// Every capability, in table order.
    pub const ALL: [Self; 4] = [Self::Cpu, Self::Cuda, Self::Metal, Self::Rocm];

    /// Get the display name for this capability.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Cuda => "CUDA",
            Self::Metal => "Metal",
            Self::Rocm => "ROCm",
        }
    }

    /// Position of this capability in fixed-size per-capability tables.
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Cuda => 1,
            Self::Metal => 2,
            Self::Rocm => 3,
        }
    }

    /// Whether this capability uses a GPU.
    pub const fn is_accelerated(self) -> bool {
        !matches!(self, Self::Cpu)
    }
}

impl fmt::Display for HardwareCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when parsing an unknown capability name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown hardware capability '{0}' (expected one of: cpu, cuda, metal, rocm)")]
pub struct ParseCapabilityError(pub String);

impl FromStr for HardwareCapability {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "cuda" => Ok(Self::Cuda),
            "metal" => Ok(Self::Metal),
            "rocm" => Ok(Self::Rocm),
            _ => Err(ParseCapabilityError(s.to_string())),
        }
    }
}
