//! Validated table of native-library install specs.
//!
//! The registry is built once and passed by reference to whatever needs
//! it. Every spec inside has already been validated, so lookups by
//! capability cannot fail.

pub mod builtin;

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::PackageSpec;
use crate::errors::{ConfigResult, ConfigurationError};

/// Immutable set of package specs keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    specs: IndexMap<String, PackageSpec>,
}

impl PackageRegistry {
    /// Build a registry, rejecting duplicate names.
    pub fn new(specs: impl IntoIterator<Item = PackageSpec>) -> ConfigResult<Self> {
        let mut map = IndexMap::new();
        for spec in specs {
            let name = spec.name().to_string();
            if map.insert(name.clone(), spec).is_some() {
                return Err(ConfigurationError::DuplicatePackage(name));
            }
        }
        debug!(packages = map.len(), "Package registry built");
        Ok(Self { specs: map })
    }

    /// The compiled-in registry (`torch`, `llama-cpp-python`).
    pub fn builtin() -> ConfigResult<Self> {
        Self::new(builtin::builtin_specs()?)
    }

    /// Look up a spec by name.
    pub fn get(&self, name: &str) -> Option<&PackageSpec> {
        self.specs.get(name)
    }

    /// Iterate specs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
