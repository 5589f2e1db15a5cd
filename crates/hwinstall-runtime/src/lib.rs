//! Side-effecting adapters and orchestration for hwinstall.
//!
//! Host hardware probing, the pip package manager adapter, version caches,
//! and the `Executor` that runs install plans.

#![deny(unsafe_code)]

pub mod cache;
pub mod executor;
pub mod pip;
pub mod system;
pub mod verify;

// Re-export the executor
pub use executor::{ExecuteError, Executor};

// Re-export adapters
pub use cache::{FileVersionCache, InMemoryVersionCache};
pub use pip::{PipPackageManager, PythonLookupError};
pub use system::{HardwareDetector, HostHardwareProbe};
pub use verify::VersionSmokeCheck;
