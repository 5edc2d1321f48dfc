//! Stand-alone calculators: bond sizing and locator checks

use crate::error::{CliError, CliResult};
use crate::output::{print_field, print_heading, print_single, print_success, OutputFormat};
use clap::Args;
use jobledger_engine::economics;
use jobledger_types::{Amount, Bps, SafeUri};
use serde::Serialize;

#[derive(Args)]
pub struct BondArgs {
    /// Job payout, in the token's smallest unit
    pub payout: u128,

    #[arg(long, default_value_t = 500)]
    pub bond_bps: u16,

    #[arg(long, default_value_t = 1_000)]
    pub slash_bps: u16,

    #[arg(long, default_value_t = 100)]
    pub fee_bps: u16,
}

#[derive(Debug, Serialize)]
struct BondQuote {
    payout: Amount,
    bond: Amount,
    slashed_on_loss: Amount,
    fee: Amount,
    agent_payout: Amount,
}

pub fn bond(args: BondArgs, format: OutputFormat) -> CliResult<()> {
    let payout = Amount::new(args.payout);
    let bond = economics::bond(payout, Bps::new(args.bond_bps)?);
    let fee = economics::fee(payout, Bps::new(args.fee_bps)?);
    let quote = BondQuote {
        payout,
        bond,
        slashed_on_loss: economics::slash(bond, Bps::new(args.slash_bps)?),
        fee,
        agent_payout: payout.saturating_sub(fee),
    };

    if format != OutputFormat::Table {
        return print_single(&quote, format);
    }
    print_heading("Bond quote");
    print_field("payout", quote.payout);
    print_field("agent stake / bond", quote.bond);
    print_field("slashed on loss", quote.slashed_on_loss);
    print_field("platform fee", quote.fee);
    print_field("agent receives", quote.agent_payout);
    Ok(())
}

#[derive(Debug, Serialize)]
struct UriCheck<'a> {
    uri: &'a str,
    scheme: &'static str,
}

pub fn check_uri(uri: &str, format: OutputFormat) -> CliResult<()> {
    let parsed = SafeUri::parse(uri)
        .map_err(|err| CliError::InvalidArgument(format!("{:?} rejected: {}", uri, err)))?;
    let check = UriCheck {
        uri: parsed.as_str(),
        scheme: parsed.scheme().as_str(),
    };

    match format {
        OutputFormat::Table => {
            print_success(&format!("{} ({})", check.uri, check.scheme));
            Ok(())
        }
        _ => print_single(&check, format),
    }
}
