//! Service dependency graph.
//!
//! The graph is built once through [`ServiceGraphBuilder`], validated for
//! duplicate names, unknown package references and cycles, and never
//! mutated afterwards. Dependency edges may point at names that are not in
//! the graph; such names are treated as leaves with nothing to install.

mod topo;

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::{Component, PackageSpec};
use crate::errors::{ConfigResult, ConfigurationError};
use crate::registry::PackageRegistry;
use crate::registry::builtin::{LLAMA_CPP_PYTHON, RAG, SERVER, TORCH, UNIVERSAL_RUNTIME};

pub(crate) use topo::NodeArena;

/// Immutable, acyclic map of component name to component.
#[derive(Debug, Clone, Default)]
pub struct ServiceGraph {
    components: IndexMap<String, Component>,
    arena: NodeArena,
}

impl ServiceGraph {
    /// Start building a graph whose package references resolve against `registry`.
    pub fn builder(registry: &PackageRegistry) -> ServiceGraphBuilder<'_> {
        ServiceGraphBuilder {
            registry,
            components: Vec::new(),
        }
    }

    /// The compiled-in service graph.
    ///
    /// `server` coordinates the two Python services, so it is installed
    /// after them. `config` is intentionally absent.
    pub fn builtin(registry: &PackageRegistry) -> ConfigResult<Self> {
        Self::builder(registry)
            .component(UNIVERSAL_RUNTIME, &[TORCH, LLAMA_CPP_PYTHON], &[])
            .component(RAG, &[], &[])
            .component(SERVER, &[], &[UNIVERSAL_RUNTIME, RAG])
            .build()
    }

    /// Look up a component by name.
    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Whether `name` is a node of the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Native packages required by `name`.
    ///
    /// Returns an empty slice both for components without packages and for
    /// names absent from the graph; callers cannot (and need not) tell the
    /// two apart.
    pub fn component_packages(&self, name: &str) -> &[PackageSpec] {
        self.components
            .get(name)
            .map_or(&[], |c| c.hardware_packages.as_slice())
    }

    /// Iterate components in definition order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) const fn arena(&self) -> &NodeArena {
        &self.arena
    }
}

struct PendingComponent {
    name: String,
    packages: Vec<String>,
    depends_on: Vec<String>,
}

/// Builder for [`ServiceGraph`].
///
/// Components reference packages by registry name; resolution and
/// validation happen in [`ServiceGraphBuilder::build`].
pub struct ServiceGraphBuilder<'r> {
    registry: &'r PackageRegistry,
    components: Vec<PendingComponent>,
}

impl ServiceGraphBuilder<'_> {
    /// Add a component with package names and dependency names.
    #[must_use]
    pub fn component(mut self, name: &str, packages: &[&str], depends_on: &[&str]) -> Self {
        self.components.push(PendingComponent {
            name: name.trim().to_string(),
            packages: packages.iter().map(ToString::to_string).collect(),
            depends_on: depends_on.iter().map(|d| d.trim().to_string()).collect(),
        });
        self
    }

    /// Resolve package references and validate the graph.
    pub fn build(self) -> ConfigResult<ServiceGraph> {
        let mut components = IndexMap::new();
        let mut arena = NodeArena::default();

        for pending in &self.components {
            if pending.name.is_empty() {
                return Err(ConfigurationError::EmptyComponentName);
            }
            if components.contains_key(&pending.name) {
                return Err(ConfigurationError::DuplicateComponent(pending.name.clone()));
            }

            let hardware_packages = pending
                .packages
                .iter()
                .map(|package| {
                    self.registry.get(package).cloned().ok_or_else(|| {
                        ConfigurationError::UnknownPackage {
                            component: pending.name.clone(),
                            package: package.clone(),
                        }
                    })
                })
                .collect::<ConfigResult<Vec<_>>>()?;

            arena.intern(&pending.name);
            components.insert(
                pending.name.clone(),
                Component {
                    name: pending.name.clone(),
                    hardware_packages,
                    depends_on: pending.depends_on.clone(),
                },
            );
        }

        for component in components.values() {
            let from = arena.intern(&component.name);
            for dep in &component.depends_on {
                let to = arena.intern(dep);
                arena.add_edge(from, to);
            }
        }

        arena.topo_order_all()?;

        debug!(
            components = components.len(),
            nodes = arena.len(),
            "Service graph validated"
        );

        Ok(ServiceGraph { components, arena })
    }
}
