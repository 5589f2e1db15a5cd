//! Detect command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{BOLD, RESET};

/// Print the capability the installer would use.
pub fn execute(ctx: &CliContext, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "hardware": ctx.hardware,
            "overridden": ctx.hardware_overridden,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let origin = if ctx.hardware_overridden {
        "override"
    } else {
        "detected"
    };
    println!("{BOLD}{}{RESET} ({origin})", ctx.hardware.display_name());
    Ok(())
}
