//! Installable service components.

use serde::Serialize;

use super::package::PackageSpec;

/// A named node of the service graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// Component name (e.g., "universal-runtime").
    pub name: String,
    /// Native packages this component needs; may be empty.
    pub hardware_packages: Vec<PackageSpec>,
    /// Names of components that must be installed first.
    pub depends_on: Vec<String>,
}
