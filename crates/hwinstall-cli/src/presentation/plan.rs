//! Plan rendering.

use hwinstall_core::{HardwareCapability, InstallPlan};

use super::{BOLD, RESET, print_separator};

/// Lines describing each step and the invocations it would run.
pub fn plan_lines(plan: &InstallPlan, hardware: HardwareCapability) -> Vec<String> {
    let mut lines = Vec::new();
    for (position, step) in plan.steps().iter().enumerate() {
        let deps = if step.depends_on.is_empty() {
            String::new()
        } else {
            format!(" (after {})", step.depends_on.join(", "))
        };
        lines.push(format!("{}. {}{deps}", position + 1, step.component));

        let invocations = step.invocations(hardware);
        if invocations.is_empty() {
            lines.push("     nothing to install".to_string());
        }
        for invocation in invocations {
            lines.push(format!("     {invocation}"));
        }
    }
    lines
}

/// Print the plan for `hardware`.
pub fn print_plan(plan: &InstallPlan, hardware: HardwareCapability) {
    println!(
        "{BOLD}Install plan for {hardware}{RESET}: {} component(s), {} package(s)",
        plan.len(),
        plan.package_count()
    );
    print_separator(60);
    for line in plan_lines(plan, hardware) {
        println!("{line}");
    }
}
