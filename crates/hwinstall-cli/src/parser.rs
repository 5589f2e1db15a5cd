//! Main CLI parser and top-level argument handling.

use clap::Parser;
use hwinstall_core::HardwareCapability;

use crate::commands::Commands;

/// Hardware-aware installer for native acceleration libraries.
#[derive(Parser)]
#[command(name = "hwinstall")]
#[command(about = "Install torch and llama-cpp-python builds matching this machine's accelerator")]
#[command(version)]
pub struct Cli {
    /// Use this capability instead of probing the host (cpu, cuda, metal, rocm)
    #[arg(long, global = true, env = "HWINSTALL_HARDWARE")]
    pub hardware: Option<HardwareCapability>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["hwinstall", "--verbose", "--hardware", "CUDA", "detect"]);
        assert!(cli.verbose);
        assert_eq!(cli.hardware, Some(HardwareCapability::Cuda));
        assert!(matches!(cli.command, Commands::Detect { json: false }));
    }

    #[test]
    fn test_unknown_hardware_rejected() {
        let result = Cli::try_parse_from(["hwinstall", "--hardware", "tpu", "detect"]);
        assert!(result.is_err());
    }
}
