//! Install planning.
//!
//! The planner expands a requested component set to its dependency closure
//! and orders it so that every dependency precedes its dependents.

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{HardwareCapability, InstallInvocation, PackageSpec};
use crate::errors::ConfigResult;
use crate::graph::ServiceGraph;

/// One component of an install plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    /// Component name.
    pub component: String,
    /// Packages to install for this component (may be empty).
    pub packages: Vec<PackageSpec>,
    /// Components that must reach a terminal state before this one starts.
    pub depends_on: Vec<String>,
}

impl PlanStep {
    /// Invocations this step would run on `capability`.
    pub fn invocations(&self, capability: HardwareCapability) -> Vec<InstallInvocation> {
        self.packages
            .iter()
            .map(|spec| spec.invocation(capability))
            .collect()
    }
}

/// Dependencies-first list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    steps: Vec<PlanStep>,
}

impl InstallPlan {
    /// Build a plan from already-ordered steps.
    pub const fn from_steps(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Position of a component in the plan.
    pub fn position(&self, component: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.component == component)
    }

    /// Total number of packages across all steps.
    pub fn package_count(&self) -> usize {
        self.steps.iter().map(|s| s.packages.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Orders requested components over a [`ServiceGraph`].
#[derive(Debug, Clone, Copy)]
pub struct InstallPlanner<'g> {
    graph: &'g ServiceGraph,
}

impl<'g> InstallPlanner<'g> {
    pub const fn new(graph: &'g ServiceGraph) -> Self {
        Self { graph }
    }

    /// Plan the install of `requested` and everything it depends on.
    ///
    /// Roots keep their request order (duplicates and blank names are
    /// dropped). Names absent from the graph become steps with no packages.
    /// A cycle is a [`ConfigurationError::Cycle`](crate::ConfigurationError::Cycle);
    /// graph construction already rejects cycles, so this only fires for a
    /// graph assembled outside the builder.
    pub fn plan<S: AsRef<str>>(&self, requested: &[S]) -> ConfigResult<InstallPlan> {
        let mut arena = self.graph.arena().clone();

        let mut roots = Vec::with_capacity(requested.len());
        for name in requested {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if !self.graph.contains(name) {
                debug!(component = %name, "Component not in service graph, nothing to install");
            }
            let index = arena.intern(name);
            if !roots.contains(&index) {
                roots.push(index);
            }
        }

        let order = arena.topo_order(&roots)?;

        let steps: Vec<PlanStep> = order
            .into_iter()
            .map(|index| {
                let component = arena.name(index);
                PlanStep {
                    component: component.to_string(),
                    packages: self.graph.component_packages(component).to_vec(),
                    depends_on: arena.dependency_names(index).map(String::from).collect(),
                }
            })
            .collect();

        let plan = InstallPlan::from_steps(steps);
        info!(
            requested = roots.len(),
            steps = plan.len(),
            packages = plan.package_count(),
            "Install plan computed"
        );
        Ok(plan)
    }
}
