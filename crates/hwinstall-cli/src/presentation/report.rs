//! Report rendering.

use hwinstall_core::{InstallStatus, PackageReport, Report};

use super::{BOLD, GREEN, RED, RESET, YELLOW, print_separator};

/// Colored status text for one package.
pub fn status_label(package: &PackageReport) -> String {
    match package.status {
        InstallStatus::Success => {
            let version = package.installed_version.as_deref().unwrap_or("?");
            format!("{GREEN}✓ installed {version}{RESET}")
        }
        InstallStatus::SkippedAlreadySatisfied => {
            let version = package.installed_version.as_deref().unwrap_or("?");
            format!("{GREEN}✓ already {version}{RESET}")
        }
        InstallStatus::Skipped => format!("{YELLOW}○ skipped{RESET}"),
        InstallStatus::Failed => format!("{RED}✗ failed{RESET}"),
    }
}

/// Print a per-component summary of `report`.
pub fn print_report(report: &Report) {
    println!("{BOLD}Install report ({}){RESET}", report.hardware);
    print_separator(60);

    for component in &report.components {
        println!("{BOLD}{}{RESET}", component.component);
        if component.packages.is_empty() {
            println!("  nothing to install");
        }
        for package in &component.packages {
            let source = package
                .satisfied_by
                .map(|s| format!(" via {s}"))
                .unwrap_or_default();
            println!(
                "  {:<20} {}{source}",
                package.package,
                status_label(package)
            );
            if package.attempts > 1 {
                println!("      attempts: {}", package.attempts);
            }
            for warning in &package.warnings {
                println!("      {YELLOW}warning:{RESET} {warning}");
            }
            if let Some(diagnostic) = &package.diagnostic {
                for line in diagnostic.lines() {
                    println!("      {line}");
                }
            }
        }
    }

    print_separator(60);
    let counts = report.counts();
    println!(
        "{} installed, {} already satisfied, {} failed, {} skipped",
        counts.success, counts.already_satisfied, counts.failed, counts.skipped
    );
    if report.cancelled {
        println!("{YELLOW}Installation was cancelled before every component started.{RESET}");
    }
}
