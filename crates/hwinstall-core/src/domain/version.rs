//! Lower-bound version constraints.
//!
//! Package specs only ever carry a `>=` floor: no pins and no upper bounds.
//! Installed versions are compared on epoch then numeric release segments, so
//! local build tags such as `+cu121` do not affect satisfaction.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// The only operator a constraint may use.
pub const FLOOR_OPERATOR: &str = ">=";

/// Reasons a version constraint is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("version constraint is empty")]
    Empty,

    #[error("version constraint '{0}' must start with '>='")]
    MissingFloorOperator(String),

    #[error("version constraint '{constraint}' uses forbidden operator '{operator}'")]
    ForbiddenOperator { constraint: String, operator: String },

    #[error("version constraint '{0}' has no numeric release")]
    InvalidRelease(String),
}

/// A parsed release version (`major.minor.patch...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    epoch: u64,
    segments: Vec<u64>,
    pre_release: bool,
}

impl ReleaseVersion {
    /// Parse a version as reported by the package manager.
    ///
    /// Accepts forms like `2.5.1`, `v0.3.2`, `2.5.1+cu121`, `2.6.0rc1` and
    /// `1!2.0`. Returns `None` when no leading numeric segment exists.
    pub fn parse(version: &str) -> Option<Self> {
        let version = version.trim();
        let (epoch, version) = match version.split_once('!') {
            Some((epoch, rest)) => (epoch.parse::<u64>().ok()?, rest),
            None => (0, version),
        };
        let version = version.split('+').next().unwrap_or(version);
        let version = version.strip_prefix('v').unwrap_or(version);

        let mut segments = Vec::new();
        let mut pre_release = false;

        for part in version.split('.') {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            if digits.is_empty() {
                // "2.0.dev1" or "2.0.post1": stop at the first non-release segment
                pre_release = part.starts_with("dev");
                break;
            }
            segments.push(digits.parse::<u64>().ok()?);
            let rest = &part[digits.len()..];
            if !rest.is_empty() {
                pre_release = !is_post_release_tag(rest);
                break;
            }
        }

        if segments.is_empty() {
            None
        } else {
            Some(Self {
                epoch,
                segments,
                pre_release,
            })
        }
    }

    /// Epoch (`N!`), zero when absent.
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Numeric release segments.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    fn segment(&self, i: usize) -> u64 {
        self.segments.get(i).copied().unwrap_or(0)
    }
}

/// `post1`, `-post1` and the implicit `-1` spelling all mark a post-release.
fn is_post_release_tag(tag: &str) -> bool {
    if let Some(number) = tag.strip_prefix('-')
        && !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit())
    {
        return true;
    }
    tag.trim_start_matches(['-', '_']).starts_with("post")
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.epoch != other.epoch {
            return self.epoch.cmp(&other.epoch);
        }
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            match self.segment(i).cmp(&other.segment(i)) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        // A pre-release sorts before the final release with the same number
        other.pre_release.cmp(&self.pre_release)
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A validated `>=` lower bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFloor {
    constraint: String,
    minimum: ReleaseVersion,
}

impl VersionFloor {
    /// Parse and validate a floor constraint such as `>=2.0.0`.
    pub fn parse(constraint: &str) -> Result<Self, ConstraintError> {
        let constraint = constraint.trim();
        if constraint.is_empty() {
            return Err(ConstraintError::Empty);
        }

        let Some(rest) = constraint.strip_prefix(FLOOR_OPERATOR) else {
            return Err(ConstraintError::MissingFloorOperator(constraint.to_string()));
        };

        for operator in ["<", ">", "=", "!", "~", ",", "*", "^"] {
            if rest.contains(operator) {
                return Err(ConstraintError::ForbiddenOperator {
                    constraint: constraint.to_string(),
                    operator: operator.to_string(),
                });
            }
        }

        let minimum = ReleaseVersion::parse(rest)
            .ok_or_else(|| ConstraintError::InvalidRelease(constraint.to_string()))?;

        Ok(Self {
            constraint: format!("{FLOOR_OPERATOR}{}", rest.trim()),
            minimum,
        })
    }

    /// The constraint text, e.g. `>=2.0.0`.
    pub fn constraint(&self) -> &str {
        &self.constraint
    }

    /// The minimum acceptable release.
    pub const fn minimum(&self) -> &ReleaseVersion {
        &self.minimum
    }

    /// Whether an installed version string satisfies this floor.
    ///
    /// Unparseable versions never satisfy the floor, which forces a reinstall.
    pub fn is_satisfied_by(&self, installed: &str) -> bool {
        ReleaseVersion::parse(installed).is_some_and(|v| v >= self.minimum)
    }
}

impl fmt::Display for VersionFloor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.constraint)
    }
}

impl Serialize for VersionFloor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.constraint)
    }
}
