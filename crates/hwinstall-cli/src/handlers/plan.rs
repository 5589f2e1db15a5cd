//! Plan command handler.

use anyhow::Result;
use hwinstall_core::InstallPlanner;

use crate::bootstrap::CliContext;
use crate::presentation::print_plan;

pub fn execute(ctx: &CliContext, components: &[String], json: bool) -> Result<()> {
    let plan = InstallPlanner::new(&ctx.graph).plan(components)?;

    if json {
        let value = serde_json::json!({
            "hardware": ctx.hardware,
            "steps": plan.steps().iter().map(|step| serde_json::json!({
                "component": step.component,
                "depends_on": step.depends_on,
                "invocations": step.invocations(ctx.hardware),
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_plan(&plan, ctx.hardware);
    }
    Ok(())
}
