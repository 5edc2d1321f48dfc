//! Scenario replay
//!
//! A scenario is a list of calls applied in order to a fresh ledger:
//!
//! ```yaml
//! config:
//!   owner: "0x0000000000000000000000000000000000000001"
//! steps:
//!   - { caller: "0x…02", at: 0, op: createJob, payout: 10000, duration: 3600, specUri: "ipfs://Qm…" }
//!   - { caller: "0x…03", at: 5, op: applyForJob, jobId: 0 }
//!   - { caller: "0x…03", at: 9, op: cancelJob, jobId: 0, expect: NotAuthorized }
//! ```
//!
//! Steps without `at` are stamped with the wall clock. A step with `expect`
//! must fail with that error name, or succeed when `expect: ok`.

use crate::error::{CliError, CliResult};
use crate::files::{read_document, write_document};
use crate::output::{print_field, print_heading, print_rows, print_single, OutputFormat};
use clap::Args;
use colored::Colorize;
use jobledger_engine::{Call, Clock, JobLedger, Operation, Outcome, Receipt, SystemClock};
use jobledger_types::{Address, LedgerConfig, LedgerError, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tabled::Tabled;
use tracing::{info, warn};

#[derive(Args)]
pub struct ReplayArgs {
    /// Scenario file (.json or .yaml)
    pub scenario: PathBuf,

    /// Ledger configuration; overrides the scenario's own `config` section
    #[arg(short, long, env = "JOBLEDGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the final ledger state to this file
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Fail when any step without an expectation is rejected
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: Option<LedgerConfig>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioStep {
    pub caller: Address,
    #[serde(default)]
    pub at: Option<Timestamp>,
    #[serde(default)]
    pub expect: Option<String>,
    #[serde(flatten)]
    pub op: Operation,
}

/// One replayed step, as reported.
#[derive(Debug, Serialize, Tabled)]
pub struct StepReport {
    #[tabled(rename = "#")]
    pub index: usize,
    pub at: Timestamp,
    pub caller: String,
    pub op: String,
    pub result: String,
    pub detail: String,
    #[tabled(skip)]
    pub events: Vec<String>,
    #[tabled(skip)]
    pub matched: bool,
}

#[derive(Debug, Serialize)]
pub struct ReplaySummary {
    pub steps: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub mismatched: usize,
    pub next_job_id: u64,
    pub live_jobs: usize,
    pub locked: String,
    pub withdrawable: String,
    pub total_deposited: String,
    pub total_paid_out: String,
    pub balanced: bool,
    pub paused: bool,
    pub settlement_paused: bool,
}

#[derive(Debug, Serialize)]
struct ReplayReport<'a> {
    steps: &'a [StepReport],
    summary: &'a ReplaySummary,
}

pub fn execute(args: ReplayArgs, format: OutputFormat) -> CliResult<()> {
    let scenario: Scenario = read_document(&args.scenario)?;
    let config = match &args.config {
        Some(path) => read_document::<LedgerConfig>(path)?,
        None => scenario.config.clone().ok_or_else(|| {
            CliError::InvalidArgument(
                "no ledger config: pass --config or add a `config` section".into(),
            )
        })?,
    };

    let (ledger, reports) = replay(config, &scenario, &SystemClock)?;
    let summary = summarize(&ledger, &reports);

    if let Some(path) = &args.save {
        write_document(path, &ledger)?;
        info!(path = %path.display(), "Ledger state saved");
    }

    match format {
        OutputFormat::Table => print_table(&reports, &summary)?,
        _ => print_single(
            &ReplayReport {
                steps: &reports,
                summary: &summary,
            },
            format,
        )?,
    }

    if summary.mismatched > 0 {
        return Err(CliError::Replay(format!(
            "{} step(s) did not match their expected result",
            summary.mismatched
        )));
    }
    if args.strict && summary.rejected > 0 {
        return Err(CliError::Replay(format!(
            "{} step(s) rejected",
            summary.rejected
        )));
    }
    Ok(())
}

/// Apply every step to a ledger built from `config`.
pub fn replay(
    config: LedgerConfig,
    scenario: &Scenario,
    clock: &dyn Clock,
) -> CliResult<(JobLedger, Vec<StepReport>)> {
    let mut ledger = JobLedger::new(config)?;
    let mut reports = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.iter().enumerate() {
        let at = step.at.unwrap_or_else(|| clock.now());
        let call = Call::new(step.caller, at, step.op.clone());
        let result = ledger.apply(&call);
        let report = report_step(index, &call, step.expect.as_deref(), &result);
        if !report.matched {
            warn!(
                step = index,
                op = call.op.name(),
                expected = step.expect.as_deref().unwrap_or("ok"),
                actual = %report.result,
                "Step did not match expectation"
            );
        }
        reports.push(report);
    }

    info!(steps = reports.len(), jobs = ledger.next_job_id(), "Replay finished");
    Ok((ledger, reports))
}

fn report_step(
    index: usize,
    call: &Call,
    expect: Option<&str>,
    result: &Result<Receipt, LedgerError>,
) -> StepReport {
    let (outcome, detail, events) = match result {
        Ok(receipt) => (
            "ok".to_string(),
            describe(&receipt.outcome),
            receipt
                .events
                .iter()
                .map(|entry| entry.event.name().to_string())
                .collect(),
        ),
        Err(err) => (err.kind().name().to_string(), err.to_string(), Vec::new()),
    };
    let matched = match expect {
        None => true,
        Some(expected) => expected.eq_ignore_ascii_case(&outcome),
    };

    StepReport {
        index,
        at: call.at,
        caller: call.caller.to_string(),
        op: call.op.name().to_string(),
        result: outcome,
        detail,
        events,
        matched,
    }
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Applied => "applied".into(),
        Outcome::Unchanged => "unchanged".into(),
        Outcome::JobCreated { job_id } => format!("job {}", job_id),
        Outcome::Paid { to, amount } => format!("paid {} to {}", amount, to),
    }
}

pub fn summarize(ledger: &JobLedger, reports: &[StepReport]) -> ReplaySummary {
    let treasury = ledger.treasury();
    let rejected = reports.iter().filter(|r| r.result != "ok").count();
    ReplaySummary {
        steps: reports.len(),
        accepted: reports.len() - rejected,
        rejected,
        mismatched: reports.iter().filter(|r| !r.matched).count(),
        next_job_id: ledger.next_job_id(),
        live_jobs: ledger.registry().live(),
        locked: treasury.locked().to_string(),
        withdrawable: treasury.withdrawable().to_string(),
        total_deposited: treasury.total_deposited().to_string(),
        total_paid_out: treasury.total_paid_out().to_string(),
        balanced: ledger.is_balanced(),
        paused: ledger.paused(),
        settlement_paused: ledger.settlement_paused(),
    }
}

fn print_table(reports: &[StepReport], summary: &ReplaySummary) -> CliResult<()> {
    print_heading("Replay");
    print_rows(reports, OutputFormat::Table)?;
    for report in reports.iter().filter(|r| !r.matched) {
        println!(
            "  {} step {} ({}) returned {}",
            "mismatch".red().bold(),
            report.index,
            report.op,
            report.result
        );
    }
    println!();
    print_heading("Ledger");
    print_field("steps", format!("{} ok, {} rejected", summary.accepted, summary.rejected));
    print_field("next job id", summary.next_job_id);
    print_field("live jobs", summary.live_jobs);
    print_field("locked", &summary.locked);
    print_field("withdrawable", &summary.withdrawable);
    print_field("deposited", &summary.total_deposited);
    print_field("paid out", &summary.total_paid_out);
    let balanced = if summary.balanced {
        "yes".green()
    } else {
        "NO".red().bold()
    };
    print_field("balanced", balanced);
    if summary.paused || summary.settlement_paused {
        print_field(
            "circuit breaker",
            format!(
                "paused={} settlement_paused={}",
                summary.paused, summary.settlement_paused
            ),
        );
    }
    Ok(())
}
