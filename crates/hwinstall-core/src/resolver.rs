//! Component → package resolution.

use crate::domain::{HardwareCapability, InstallInvocation, PackageSpec};
use crate::graph::ServiceGraph;

/// Read-only view over a [`ServiceGraph`] that answers package questions.
///
/// Unknown component names are not an error anywhere here: they resolve
/// to "nothing to install", so a manifest may name components the graph
/// has not caught up with yet.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'g> {
    graph: &'g ServiceGraph,
}

impl<'g> Resolver<'g> {
    pub const fn new(graph: &'g ServiceGraph) -> Self {
        Self { graph }
    }

    /// Package specs required by `component` (empty if none or unknown).
    pub fn component_packages(&self, component: &str) -> &'g [PackageSpec] {
        self.graph.component_packages(component)
    }

    /// Package-manager invocations for `component` on `capability`.
    pub fn invocations(
        &self,
        component: &str,
        capability: HardwareCapability,
    ) -> Vec<InstallInvocation> {
        self.component_packages(component)
            .iter()
            .map(|spec| spec.invocation(capability))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceSelection;
    use crate::registry::PackageRegistry;
    use crate::registry::builtin::{TORCH_CPU_INDEX, UNIVERSAL_RUNTIME};

    #[test]
    fn test_invocations_follow_capability() {
        let registry = PackageRegistry::builtin().unwrap();
        let graph = ServiceGraph::builtin(&registry).unwrap();
        let resolver = Resolver::new(&graph);

        let cpu = resolver.invocations(UNIVERSAL_RUNTIME, HardwareCapability::Cpu);
        assert_eq!(cpu.len(), 2);
        assert_eq!(cpu[0].source().url(), Some(TORCH_CPU_INDEX));

        let metal = resolver.invocations(UNIVERSAL_RUNTIME, HardwareCapability::Metal);
        assert_eq!(metal[0].source(), &SourceSelection::Default);
    }

    #[test]
    fn test_unknown_component_has_no_invocations() {
        let registry = PackageRegistry::builtin().unwrap();
        let graph = ServiceGraph::builtin(&registry).unwrap();
        let resolver = Resolver::new(&graph);
        assert!(resolver.invocations("typo-runtime", HardwareCapability::Cuda).is_empty());
    }
}
