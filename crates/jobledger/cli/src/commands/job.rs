//! Inspect a saved ledger state

use crate::error::{CliError, CliResult};
use crate::files::read_document;
use crate::output::{print_field, print_heading, print_rows, print_single, OutputFormat};
use clap::Subcommand;
use colored::Colorize;
use jobledger_engine::{Deadlines, JobLedger};
use jobledger_types::{Job, JobId, JobStatus, Timestamp};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List jobs in a saved ledger
    List {
        /// Ledger state written by `replay --save`
        #[arg(short, long)]
        state: PathBuf,
        /// Only jobs with this status
        #[arg(long)]
        status: Option<String>,
        /// Evaluate lapsed deadlines at this timestamp
        #[arg(long)]
        at: Option<Timestamp>,
    },

    /// Show one job
    Show {
        #[arg(short, long)]
        state: PathBuf,
        /// Job id
        id: u64,
        #[arg(long)]
        at: Option<Timestamp>,
    },

    /// Show the event journal
    Journal {
        #[arg(short, long)]
        state: PathBuf,
        /// Only events for this job
        #[arg(long)]
        job: Option<u64>,
    },
}

#[derive(Serialize, Tabled)]
struct JobRow {
    id: u64,
    status: String,
    employer: String,
    agent: String,
    payout: String,
    approvals: u32,
    disapprovals: u32,
    escrow: String,
}

impl JobRow {
    fn new(job: &Job, status: JobStatus) -> Self {
        Self {
            id: job.id.value(),
            status: status.to_string(),
            employer: job.core.employer.to_string(),
            agent: job
                .agent()
                .map(|agent| agent.to_string())
                .unwrap_or_else(|| "-".into()),
            payout: job.core.payout.to_string(),
            approvals: job.validation.approvals,
            disapprovals: job.validation.disapprovals,
            escrow: job.escrow.total().to_string(),
        }
    }
}

#[derive(Serialize)]
struct JobView<'a> {
    status: JobStatus,
    deadlines: Deadlines,
    job: &'a Job,
}

#[derive(Serialize, Tabled)]
struct JournalRow {
    seq: u64,
    at: Timestamp,
    event: String,
    job: String,
}

/// Execute job command
pub fn execute(command: JobCommands, format: OutputFormat) -> CliResult<()> {
    match command {
        JobCommands::List { state, status, at } => {
            list_jobs(&load(&state)?, status.as_deref(), at, format)
        }
        JobCommands::Show { state, id, at } => show_job(&load(&state)?, JobId(id), at, format),
        JobCommands::Journal { state, job } => show_journal(&load(&state)?, job, format),
    }
}

fn load(path: &Path) -> CliResult<JobLedger> {
    read_document(path)
}

fn status_of(ledger: &JobLedger, job: &Job, at: Option<Timestamp>) -> CliResult<JobStatus> {
    match at {
        Some(now) => Ok(ledger.status_at(job.id, now)?),
        None => Ok(job.status()),
    }
}

fn list_jobs(
    ledger: &JobLedger,
    status_filter: Option<&str>,
    at: Option<Timestamp>,
    format: OutputFormat,
) -> CliResult<()> {
    let mut rows = Vec::new();
    for job in ledger.jobs() {
        let status = status_of(ledger, job, at)?;
        let keep = status_filter
            .map(|wanted| status.name().eq_ignore_ascii_case(wanted))
            .unwrap_or(true);
        if keep {
            rows.push(JobRow::new(job, status));
        }
    }

    if format == OutputFormat::Table {
        print_heading("Jobs");
    }
    print_rows(&rows, format)?;
    if format == OutputFormat::Table {
        println!();
        println!(
            "Total: {} job(s), next id {}",
            rows.len(),
            ledger.next_job_id()
        );
    }
    Ok(())
}

fn show_job(
    ledger: &JobLedger,
    id: JobId,
    at: Option<Timestamp>,
    format: OutputFormat,
) -> CliResult<()> {
    let job = ledger.job(id).job().ok_or_else(|| {
        if id.value() < ledger.next_job_id() {
            CliError::NotFound(format!("job {} was deleted", id))
        } else {
            CliError::NotFound(format!("job {} was never created", id))
        }
    })?;
    let view = JobView {
        status: status_of(ledger, job, at)?,
        deadlines: ledger.deadlines(id)?,
        job,
    };

    if format != OutputFormat::Table {
        return print_single(&view, format);
    }

    print_heading(&format!("Job {}", id));
    print_field("status", view.status.to_string().bold());
    print_field("employer", job.core.employer);
    print_field(
        "agent",
        job.agent()
            .map(|agent| agent.to_string())
            .unwrap_or_else(|| "-".into()),
    );
    print_field("payout", job.core.payout);
    print_field("duration", format!("{}s", job.core.duration));
    print_field("spec", &job.spec_uri);
    if let Some(uri) = &job.completion_uri {
        print_field("completion", uri);
    }
    print_field(
        "votes",
        format!(
            "{} approve / {} disapprove",
            job.validation.approvals, job.validation.disapprovals
        ),
    );
    print_field(
        "escrow",
        format!(
            "payout {} + stake {} + bond {}",
            job.escrow.payout, job.escrow.agent_stake, job.escrow.dispute_bond
        ),
    );
    if let Some(expiry) = view.deadlines.expiry_time {
        print_field("expires at", expiry);
    }
    if let Some(deadline) = view.deadlines.dispute_deadline {
        print_field("dispute deadline", deadline);
    }
    Ok(())
}

fn show_journal(ledger: &JobLedger, job: Option<u64>, format: OutputFormat) -> CliResult<()> {
    let entries: Vec<_> = ledger
        .journal()
        .entries()
        .iter()
        .filter(|entry| job.map_or(true, |id| entry.event.job_id() == Some(JobId(id))))
        .collect();

    if format != OutputFormat::Table {
        // full event payloads for machine consumers
        return print_single(&entries, format);
    }
    let rows: Vec<JournalRow> = entries
        .iter()
        .map(|entry| JournalRow {
            seq: entry.sequence,
            at: entry.at,
            event: entry.event.name().to_string(),
            job: entry
                .event
                .job_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
        })
        .collect();
    print_rows(&rows, format)
}
