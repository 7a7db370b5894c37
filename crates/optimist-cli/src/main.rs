//! # optimist CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use optimist_cli::simulate::{run_simulate, SimulateArgs};
use optimist_cli::validate::{run_validate, ValidateArgs};

/// Optimistic oracle toolchain.
///
/// Validates oracle configuration and replays request/propose/dispute/settle
/// scenarios against in-memory backends.
#[derive(Parser, Debug)]
#[command(name = "optimist", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Oracle configuration file; overrides a scenario's inline config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an oracle configuration file.
    Validate(ValidateArgs),

    /// Replay a scenario and print a JSON report.
    Simulate(SimulateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("optimist CLI starting");

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Simulate(args) => run_simulate(args, cli.config.as_ref()),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_validate() {
        let cli = Cli::try_parse_from(["optimist", "validate", "oracle.yaml"]).unwrap();
        match cli.command {
            Commands::Validate(args) => assert_eq!(args.path, PathBuf::from("oracle.yaml")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parse_simulate_with_out() {
        let cli = Cli::try_parse_from([
            "optimist",
            "simulate",
            "scenario.yaml",
            "--out",
            "report.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.scenario, PathBuf::from("scenario.yaml"));
                assert_eq!(args.out, Some(PathBuf::from("report.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_parse_global_config() {
        let cli = Cli::try_parse_from([
            "optimist",
            "--config",
            "oracle.yaml",
            "simulate",
            "scenario.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("oracle.yaml")));
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli = Cli::try_parse_from(["optimist", "validate", "c.yaml"]).unwrap();
        assert_eq!(cli.verbose, 0);
        let cli = Cli::try_parse_from(["optimist", "-vv", "validate", "c.yaml"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["optimist"]).is_err());
    }
}
