//! Domain types for hardware-aware package resolution.
//!
//! These types are pure: no process execution, no filesystem access.

mod component;
mod hardware;
mod invocation;
mod package;
mod version;

pub use component::Component;
pub use hardware::{HardwareCapability, ParseCapabilityError};
pub use invocation::{InstallInvocation, SatisfiedBy, SourceSelection};
pub use package::{PackageSpec, WheelUrls};
pub use version::{ConstraintError, FLOOR_OPERATOR, ReleaseVersion, VersionFloor};
