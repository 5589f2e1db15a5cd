//! Command handlers.
//!
//! Handlers take the `CliContext`, call into core and runtime, and format
//! output. They hold no resolution or ordering logic.

pub mod detect;
pub mod install;
pub mod plan;
