//! Configuration error taxonomy.
//!
//! Configuration errors describe a corrupt static table or graph. They are
//! raised when the registry or the service graph is constructed, and again
//! by the planner only if a cycle slipped past construction.

use thiserror::Error;

use crate::domain::{ConstraintError, HardwareCapability};

/// Fatal errors in the package registry or service graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A package spec was given an empty name.
    #[error("package spec name cannot be empty")]
    EmptyPackageName,

    /// A package spec has no URL entry for a capability.
    #[error("package '{package}' has no wheel source entry for {capability}")]
    MissingWheelUrl {
        package: String,
        capability: HardwareCapability,
    },

    /// A package spec's version is not a plain `>=` floor.
    #[error("package '{package}' has an invalid version: {source}")]
    InvalidVersion {
        package: String,
        #[source]
        source: ConstraintError,
    },

    /// Two package specs share a name.
    #[error("package '{0}' is registered more than once")]
    DuplicatePackage(String),

    /// A component was given an empty name.
    #[error("component name cannot be empty")]
    EmptyComponentName,

    /// Two components share a name.
    #[error("component '{0}' is defined more than once")]
    DuplicateComponent(String),

    /// A component references a package the registry does not know.
    #[error("component '{component}' references unknown package '{package}'")]
    UnknownPackage { component: String, package: String },

    /// The dependency graph contains a cycle.
    ///
    /// `from -> to` is the edge that closes the cycle; `path` lists the
    /// components on the cycle starting and ending at `to`.
    #[error("dependency cycle: '{from}' depends on '{to}' ({})", path.join(" -> "))]
    Cycle {
        from: String,
        to: String,
        path: Vec<String>,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_names_edge_and_path() {
        let err = ConfigurationError::Cycle {
            from: "b".to_string(),
            to: "a".to_string(),
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'b' depends on 'a'"));
        assert!(msg.contains("a -> b -> a"));
    }

    #[test]
    fn test_missing_url_message() {
        let err = ConfigurationError::MissingWheelUrl {
            package: "torch".to_string(),
            capability: HardwareCapability::Rocm,
        };
        assert_eq!(err.to_string(), "package 'torch' has no wheel source entry for ROCm");
    }
}
