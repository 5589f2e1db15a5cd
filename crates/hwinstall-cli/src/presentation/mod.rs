//! Terminal rendering for plans and reports.
//!
//! Format-only: nothing here decides what to install.

pub mod plan;
pub mod report;

pub use plan::print_plan;
pub use report::{print_report, status_label};

// ANSI color codes
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const YELLOW: &str = "\x1b[33m";
pub(crate) const BOLD: &str = "\x1b[1m";
pub(crate) const RESET: &str = "\x1b[0m";

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}
