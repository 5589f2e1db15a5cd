//! Package-manager invocations derived from a spec and a capability.

use std::fmt;

use serde::Serialize;

/// Which artifact sources an install may search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSelection {
    /// No override: the package manager's default source only.
    Default,
    /// The URL is the sole primary source.
    Replace { url: String, fallback_to_default: bool },
    /// The URL is searched alongside the default source.
    Supplemental { url: String },
}

impl SourceSelection {
    /// Capability-specific URL, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Replace { url, .. } | Self::Supplemental { url } => Some(url),
        }
    }
}

/// Which source ultimately satisfied an install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SatisfiedBy {
    /// The default package source.
    DefaultSource,
    /// The capability-specific source used as the sole primary source.
    ReplacementSource,
    /// The capability-specific source added alongside the default.
    SupplementalSource,
    /// The default source, after the capability-specific source failed.
    DefaultFallback,
}

impl fmt::Display for SatisfiedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DefaultSource => "default source",
            Self::ReplacementSource => "capability index",
            Self::SupplementalSource => "supplemental index",
            Self::DefaultFallback => "default source (fallback)",
        })
    }
}

/// One `install "<name><constraint>" [<source-flag> <url>]` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallInvocation {
    package: String,
    requirement: String,
    source: SourceSelection,
}

impl InstallInvocation {
    pub fn new(
        package: impl Into<String>,
        requirement: impl Into<String>,
        source: SourceSelection,
    ) -> Self {
        Self {
            package: package.into(),
            requirement: requirement.into(),
            source,
        }
    }

    /// Bare package name, e.g. `torch`.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Requirement with constraint, e.g. `torch>=2.0.0`.
    pub fn requirement(&self) -> &str {
        &self.requirement
    }

    pub const fn source(&self) -> &SourceSelection {
        &self.source
    }

    /// The default-source retry for a replacing source that allows fallback.
    ///
    /// Returns `None` for every other selection: a default install has
    /// nothing to fall back to, and a supplemental source already keeps the
    /// default in scope.
    pub fn default_source_fallback(&self) -> Option<Self> {
        match self.source {
            SourceSelection::Replace {
                fallback_to_default: true,
                ..
            } => Some(Self {
                package: self.package.clone(),
                requirement: self.requirement.clone(),
                source: SourceSelection::Default,
            }),
            _ => None,
        }
    }

    /// Attribute a successful install to a source.
    ///
    /// `output` is the package manager's captured output. For a
    /// supplemental source, the install is credited to it when the output
    /// shows an artifact fetched from that URL, or from any host other than
    /// the default index. Index pages often link wheels hosted elsewhere
    /// (release assets, CDNs).
    pub fn satisfied_by(&self, output: &str) -> SatisfiedBy {
        match &self.source {
            SourceSelection::Default => SatisfiedBy::DefaultSource,
            SourceSelection::Replace { .. } => SatisfiedBy::ReplacementSource,
            SourceSelection::Supplemental { url } => {
                let base = url.trim_end_matches('/');
                let fetched_from_supplemental = output
                    .lines()
                    .filter(|line| !line.trim_start().starts_with("Looking in indexes"))
                    .any(|line| {
                        line.contains(base)
                            || fetched_url(line).is_some_and(|url| !is_default_index_host(url))
                    });
                if fetched_from_supplemental {
                    SatisfiedBy::SupplementalSource
                } else {
                    SatisfiedBy::DefaultSource
                }
            }
        }
    }
}

/// Hosts serving the default index and its files.
const DEFAULT_INDEX_HOSTS: &[&str] = &["pypi.org", "files.pythonhosted.org"];

/// The URL of a `Downloading <url>` or `Using cached <url>` line.
fn fetched_url(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let rest = line
        .strip_prefix("Downloading ")
        .or_else(|| line.strip_prefix("Using cached "))?;
    let url = rest.split_whitespace().next()?;
    (url.starts_with("https://") || url.starts_with("http://")).then_some(url)
}

fn is_default_index_host(url: &str) -> bool {
    let host = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest)
        .split(['/', ':'])
        .next()
        .unwrap_or_default();
    DEFAULT_INDEX_HOSTS.contains(&host)
}

impl fmt::Display for InstallInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            SourceSelection::Default => write!(f, "{} (default source)", self.requirement),
            SourceSelection::Replace { url, .. } => {
                write!(f, "{} (index {url}, replaces default)", self.requirement)
            }
            SourceSelection::Supplemental { url } => {
                write!(f, "{} (extra index {url})", self.requirement)
            }
        }
    }
}
