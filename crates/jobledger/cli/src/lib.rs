//! Job ledger CLI
//!
//! A terminal front end for the job ledger engine:
//! - Replay scenario files of calls against a fresh ledger
//! - Inspect jobs and the event journal of a saved ledger state
//! - Quote bonds, fees and slashes for a payout
//! - Check resource locators against the allowed scheme set
//! - Write and validate ledger configuration files

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod files;
mod output;

use commands::{config, job, replay, tools};
pub use error::{CliError, CliResult};
pub use output::{print_error, OutputFormat};

/// Job ledger CLI application
#[derive(Parser)]
#[command(name = "jobledger")]
#[command(about = "Job ledger - escrowed jobs, validator votes and dispute settlement", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Apply a scenario of calls to a fresh ledger
    Replay(replay::ReplayArgs),

    /// Inspect jobs in a saved ledger state
    Job {
        #[command(subcommand)]
        command: job::JobCommands,
    },

    /// Quote the bond, fee and slash for a payout
    Bond(tools::BondArgs),

    /// Check a resource locator against the allowed schemes
    CheckUri {
        /// Locator to check
        uri: String,
    },

    /// Manage ledger configuration files
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Logs go to stderr so json/yaml output stays parseable. `try_init`
    // because `run_with_args` may run more than once in one process (tests);
    // the first subscriber stays installed.
    let filter = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();

    match cli.command {
        Commands::Replay(args) => replay::execute(args, cli.output),
        Commands::Job { command } => job::execute(command, cli.output),
        Commands::Bond(args) => tools::bond(args, cli.output),
        Commands::CheckUri { uri } => tools::check_uri(&uri, cli.output),
        Commands::Config { command } => config::execute(command, cli.output),
    }
}
