//! Composition root: builds the registry, graph and hardware context
//! shared by every handler.

use anyhow::{Context, Result};
use hwinstall_core::{HardwareCapability, PackageRegistry, ServiceGraph};
use hwinstall_runtime::HardwareDetector;
use tracing::debug;

/// Everything a handler needs.
pub struct CliContext {
    pub registry: PackageRegistry,
    pub graph: ServiceGraph,
    pub hardware: HardwareCapability,
    /// Whether `hardware` came from `--hardware`/`HWINSTALL_HARDWARE`.
    pub hardware_overridden: bool,
}

/// Build the context, probing the host unless a capability is given.
pub fn bootstrap(hardware_override: Option<HardwareCapability>) -> Result<CliContext> {
    let registry = PackageRegistry::builtin().context("Built-in package table is invalid")?;
    let graph = ServiceGraph::builtin(&registry).context("Built-in service graph is invalid")?;

    let (hardware, hardware_overridden) = match hardware_override {
        Some(hw) => {
            debug!(%hw, "Using hardware override");
            (hw, true)
        }
        None => (HardwareDetector::new().detect(), false),
    };

    Ok(CliContext {
        registry,
        graph,
        hardware,
        hardware_overridden,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_with_override() {
        let ctx = bootstrap(Some(HardwareCapability::Rocm)).unwrap();
        assert_eq!(ctx.hardware, HardwareCapability::Rocm);
        assert!(ctx.hardware_overridden);
        assert_eq!(ctx.registry.len(), 2);
        assert!(ctx.graph.contains("server"));
    }
}
