//! Native-library install specs.

use std::collections::BTreeMap;

use serde::Serialize;

use super::hardware::HardwareCapability;
use super::invocation::{InstallInvocation, SourceSelection};
use super::version::VersionFloor;
use crate::errors::{ConfigResult, ConfigurationError};

/// Per-capability artifact sources.
///
/// Total by construction: one entry per [`HardwareCapability`]. An empty
/// string means "use the default package source".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelUrls([String; 4]);

impl WheelUrls {
    /// Build the table, rejecting any missing capability.
    fn from_map(
        package: &str,
        mut urls: BTreeMap<HardwareCapability, String>,
    ) -> ConfigResult<Self> {
        let mut take = |capability: HardwareCapability| {
            urls.remove(&capability)
                .map(|url| url.trim().to_string())
                .ok_or_else(|| ConfigurationError::MissingWheelUrl {
                    package: package.to_string(),
                    capability,
                })
        };

        Ok(Self([
            take(HardwareCapability::Cpu)?,
            take(HardwareCapability::Cuda)?,
            take(HardwareCapability::Metal)?,
            take(HardwareCapability::Rocm)?,
        ]))
    }

    /// Source URL for a capability (empty for the default source).
    pub fn get(&self, capability: HardwareCapability) -> &str {
        &self.0[capability.index()]
    }

    /// Iterate `(capability, url)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (HardwareCapability, &str)> {
        HardwareCapability::ALL
            .into_iter()
            .map(move |hw| (hw, self.get(hw)))
    }
}

impl Serialize for WheelUrls {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Install spec for one native acceleration library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSpec {
    name: String,
    version: VersionFloor,
    wheel_urls: WheelUrls,
    use_index_url: bool,
    fallback_to_default: bool,
}

impl PackageSpec {
    /// Create a validated spec.
    ///
    /// Rejects an empty name, a version that is not a plain `>=` floor, and
    /// a URL table missing any capability.
    pub fn new(
        name: impl Into<String>,
        version: &str,
        wheel_urls: BTreeMap<HardwareCapability, String>,
        use_index_url: bool,
        fallback_to_default: bool,
    ) -> ConfigResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyPackageName);
        }

        let version =
            VersionFloor::parse(version).map_err(|source| ConfigurationError::InvalidVersion {
                package: name.clone(),
                source,
            })?;

        let wheel_urls = WheelUrls::from_map(&name, wheel_urls)?;

        Ok(Self {
            name,
            version,
            wheel_urls,
            use_index_url,
            fallback_to_default,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn version(&self) -> &VersionFloor {
        &self.version
    }

    pub const fn wheel_urls(&self) -> &WheelUrls {
        &self.wheel_urls
    }

    /// Source URL for `capability`; empty means the default source.
    pub fn wheel_url(&self, capability: HardwareCapability) -> &str {
        self.wheel_urls.get(capability)
    }

    /// Whether a non-empty URL replaces (rather than augments) the default source.
    pub const fn use_index_url(&self) -> bool {
        self.use_index_url
    }

    /// Whether a failed capability source may be retried against the default source.
    pub const fn fallback_to_default(&self) -> bool {
        self.fallback_to_default
    }

    /// Requirement string passed to the package manager, e.g. `torch>=2.0.0`.
    pub fn requirement(&self) -> String {
        format!("{}{}", self.name, self.version.constraint())
    }

    /// Derive the package-manager invocation for `capability`.
    pub fn invocation(&self, capability: HardwareCapability) -> InstallInvocation {
        let url = self.wheel_url(capability);
        let source = if url.is_empty() {
            SourceSelection::Default
        } else if self.use_index_url {
            SourceSelection::Replace {
                url: url.to_string(),
                fallback_to_default: self.fallback_to_default,
            }
        } else {
            SourceSelection::Supplemental {
                url: url.to_string(),
            }
        };

        InstallInvocation::new(&self.name, self.requirement(), source)
    }
}
