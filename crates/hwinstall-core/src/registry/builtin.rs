//! Compiled-in package table and service components.
//!
//! The accelerator index URLs are tied to specific toolkit releases
//! (`cu121`, `rocm6.2`). They are kept as fixed values and need updating
//! when the upstream wheel indexes move on.

use std::collections::BTreeMap;

use crate::domain::{HardwareCapability, PackageSpec};
use crate::errors::ConfigResult;

/// Tensor-math accelerator package.
pub const TORCH: &str = "torch";

/// Inference-runtime package.
pub const LLAMA_CPP_PYTHON: &str = "llama-cpp-python";

/// Dedicated CPU-only wheel index for torch.
pub const TORCH_CPU_INDEX: &str = "https://download.pytorch.org/whl/cpu";

/// Dedicated ROCm wheel index for torch.
pub const TORCH_ROCM_INDEX: &str = "https://download.pytorch.org/whl/rocm6.2";

/// Base path shared by every llama-cpp-python wheel index.
pub const LLAMA_CPP_WHEEL_BASE: &str = "https://abetlen.github.io/llama-cpp-python/whl/";

/// Component hosting the inference runtimes.
pub const UNIVERSAL_RUNTIME: &str = "universal-runtime";

/// Retrieval component (no native packages).
pub const RAG: &str = "rag";

/// API server component (no native packages).
pub const SERVER: &str = "server";

const TORCH_FLOOR: &str = ">=2.0.0";
const LLAMA_CPP_FLOOR: &str = ">=0.3.0";

/// The torch spec.
///
/// CUDA and Metal builds are published on the default index, so only CPU
/// and ROCm carry a dedicated source. The dedicated source replaces the
/// default; if it has no matching wheel the default is tried.
pub fn torch_spec() -> ConfigResult<PackageSpec> {
    PackageSpec::new(
        TORCH,
        TORCH_FLOOR,
        BTreeMap::from([
            (HardwareCapability::Cpu, TORCH_CPU_INDEX.to_string()),
            (HardwareCapability::Cuda, String::new()),
            (HardwareCapability::Metal, String::new()),
            (HardwareCapability::Rocm, TORCH_ROCM_INDEX.to_string()),
        ]),
        true,
        true,
    )
}

/// The llama-cpp-python spec.
///
/// Every capability has its own prebuilt wheel index, added alongside the
/// default index so a source build stays possible.
pub fn llama_cpp_python_spec() -> ConfigResult<PackageSpec> {
    let variant = |suffix: &str| format!("{LLAMA_CPP_WHEEL_BASE}{suffix}");
    PackageSpec::new(
        LLAMA_CPP_PYTHON,
        LLAMA_CPP_FLOOR,
        BTreeMap::from([
            (HardwareCapability::Cpu, variant("cpu")),
            (HardwareCapability::Cuda, variant("cu121")),
            (HardwareCapability::Metal, variant("metal")),
            (HardwareCapability::Rocm, variant("rocm")),
        ]),
        false,
        true,
    )
}

/// All compiled-in package specs.
pub fn builtin_specs() -> ConfigResult<Vec<PackageSpec>> {
    Ok(vec![torch_spec()?, llama_cpp_python_spec()?])
}
