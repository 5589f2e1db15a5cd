//! Subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the detected hardware capability
    Detect {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the ordered install plan without installing anything
    Plan {
        /// Components to plan (e.g. "server", "universal-runtime")
        #[arg(required = true)]
        components: Vec<String>,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Install the native libraries the components need
    Install(InstallArgs),
}

/// Arguments for `install`.
#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// Components to install, with their dependencies
    #[arg(required = true)]
    pub components: Vec<String>,

    /// Python interpreter whose environment receives the packages
    #[arg(long, env = "HWINSTALL_PYTHON")]
    pub python: Option<PathBuf>,

    /// Components installed concurrently (1-8)
    #[arg(long, env = "HWINSTALL_PARALLELISM")]
    pub parallelism: Option<usize>,

    /// Attempts per package for network failures (1-10)
    #[arg(long, env = "HWINSTALL_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Timeout for one install attempt, in seconds
    #[arg(long, env = "HWINSTALL_STEP_TIMEOUT")]
    pub step_timeout: Option<u64>,

    /// JSON file caching installed versions between runs
    #[arg(long, env = "HWINSTALL_CACHE")]
    pub cache: Option<PathBuf>,

    /// Skip the post-install version check
    #[arg(long)]
    pub no_verify: bool,

    /// Print the invocations that would run and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::parser::Cli;

    use super::*;

    #[test]
    fn test_install_args() {
        let cli = Cli::parse_from([
            "hwinstall",
            "install",
            "server",
            "rag",
            "--parallelism",
            "3",
            "--python",
            "/usr/bin/python3",
            "--dry-run",
        ]);
        let Commands::Install(args) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(args.components, ["server", "rag"]);
        assert_eq!(args.parallelism, Some(3));
        assert_eq!(args.python, Some(PathBuf::from("/usr/bin/python3")));
        assert!(args.dry_run);
        assert!(!args.no_verify);
    }

    #[test]
    fn test_plan_requires_components() {
        assert!(Cli::try_parse_from(["hwinstall", "plan"]).is_err());
    }
}
