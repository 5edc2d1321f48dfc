//! Ledger configuration files

use crate::error::CliResult;
use crate::files::{read_document, write_document};
use crate::output::{print_field, print_heading, print_single, print_success, OutputFormat};
use clap::Subcommand;
use jobledger_types::{Address, LedgerConfig};
use std::path::PathBuf;

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write a configuration with default parameters
    Init {
        /// Platform owner
        #[arg(long)]
        owner: Address,
        /// Target file; printed to stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Load, validate and print a configuration
    Show {
        /// Configuration file (.toml, .json or .yaml)
        path: PathBuf,
    },
}

/// Execute config command
pub fn execute(command: ConfigCommands, format: OutputFormat) -> CliResult<()> {
    match command {
        ConfigCommands::Init { owner, out } => init(owner, out, format),
        ConfigCommands::Show { path } => show(path, format),
    }
}

fn init(owner: Address, out: Option<PathBuf>, format: OutputFormat) -> CliResult<()> {
    let config = LedgerConfig::new(owner);
    config.validate()?;

    match out {
        Some(path) => {
            write_document(&path, &config)?;
            print_success(&format!("wrote {}", path.display()));
            Ok(())
        }
        None => match format {
            OutputFormat::Table => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
            _ => print_single(&config, format),
        },
    }
}

fn show(path: PathBuf, format: OutputFormat) -> CliResult<()> {
    let config: LedgerConfig = read_document(&path)?;
    config.validate()?;

    if format != OutputFormat::Table {
        return print_single(&config, format);
    }
    print_heading(&format!("Ledger config ({})", path.display()));
    print_field("owner", config.owner);
    print_field("first job id", config.next_job_id);
    print_field(
        "quorum",
        format!(
            "{} approvals / {} disapprovals",
            config.quorum.required_approvals, config.quorum.required_disapprovals
        ),
    );
    print_field(
        "review periods",
        format!(
            "completion {}s, dispute {}s",
            config.review.completion_review_period, config.review.dispute_review_period
        ),
    );
    print_field("bond", config.economics.bond_bps);
    print_field("slash", config.economics.slash_bps);
    print_field("fee", config.economics.fee_bps);
    print_field(
        "admission",
        format!(
            "agents {:?}, validators {:?}",
            config.identity.agents, config.identity.validators
        ),
    );
    Ok(())
}
