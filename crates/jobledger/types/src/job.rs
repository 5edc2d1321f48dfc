//! Job records
//!
//! A job is stored as the two tuples front-ends read (`core` and
//! `validation`) plus the locators, the note, and the value the ledger holds
//! on the job's behalf. Its visible status is never stored; it is derived
//! from the flags with a fixed precedence, see [`Job::status`].

use crate::{Address, Amount, SafeUri};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unix time in seconds, as supplied by the execution environment.
pub type Timestamp = u64;

/// Job identifier. Allocated sequentially and never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Parties, terms and outcome flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCore {
    pub employer: Address,
    /// `Address::ZERO` while unassigned
    pub assigned_agent: Address,
    pub payout: Amount,
    /// Seconds the agent has after assignment
    pub duration: u64,
    /// 0 while unassigned
    pub assigned_at: Timestamp,
    pub completed: bool,
    pub disputed: bool,
    pub expired: bool,
}

/// Completion review progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobValidation {
    pub completion_requested: bool,
    pub approvals: u32,
    pub disapprovals: u32,
    pub completion_requested_at: Timestamp,
    pub disputed_at: Timestamp,
    /// When approvals met the quorum in force at that vote
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quorum_reached_at: Option<Timestamp>,
}

/// Value the ledger currently holds for a job.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEscrow {
    /// Employer's payout, until settled or refunded
    pub payout: Amount,
    /// Agent's stake, locked at assignment
    pub agent_stake: Amount,
    /// Bond locked by whoever raised the dispute
    pub dispute_bond: Amount,
}

impl JobEscrow {
    pub fn total(&self) -> Amount {
        self.payout
            .saturating_add(self.agent_stake)
            .saturating_add(self.dispute_bond)
    }

    pub fn is_empty(&self) -> bool {
        self.total().is_zero()
    }
}

/// A unit of paid work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub core: JobCore,
    pub validation: JobValidation,
    pub spec_uri: SafeUri,
    pub completion_uri: Option<SafeUri>,
    pub note: String,
    pub escrow: JobEscrow,
    /// Who raised the dispute; `None` when a disapproval quorum raised it
    pub disputant: Option<Address>,
    /// Validators that already voted on this job
    pub voters: BTreeSet<Address>,
    pub created_at: Timestamp,
}

impl Job {
    /// A freshly created, unassigned job holding the employer's payout.
    pub fn new(
        id: JobId,
        employer: Address,
        payout: Amount,
        duration: u64,
        spec_uri: SafeUri,
        note: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            core: JobCore {
                employer,
                assigned_agent: Address::ZERO,
                payout,
                duration,
                assigned_at: 0,
                completed: false,
                disputed: false,
                expired: false,
            },
            validation: JobValidation::default(),
            spec_uri,
            completion_uri: None,
            note: note.into(),
            escrow: JobEscrow {
                payout,
                ..JobEscrow::default()
            },
            disputant: None,
            voters: BTreeSet::new(),
            created_at,
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.core.assigned_agent.is_zero()
    }

    pub fn agent(&self) -> Option<Address> {
        self.is_assigned().then_some(self.core.assigned_agent)
    }

    /// Visible status from stored flags. First matching rule wins:
    ///
    /// 1. `Settled` when completed, or when both disputed and expired are set
    /// 2. `Disputed`
    /// 3. `Expired`
    /// 4. `CompletionRequested`
    /// 5. `Assigned` when an agent is set
    /// 6. `Open`
    pub fn status(&self) -> JobStatus {
        let core = &self.core;
        if core.completed || (core.disputed && core.expired) {
            JobStatus::Settled
        } else if core.disputed {
            JobStatus::Disputed
        } else if core.expired {
            JobStatus::Expired
        } else if self.validation.completion_requested {
            JobStatus::CompletionRequested
        } else if self.is_assigned() {
            JobStatus::Assigned
        } else {
            JobStatus::Open
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voters.contains(voter)
    }
}

/// Externally visible job status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Open,
    Assigned,
    CompletionRequested,
    Disputed,
    Expired,
    Settled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Open,
        JobStatus::Assigned,
        JobStatus::CompletionRequested,
        JobStatus::Disputed,
        JobStatus::Expired,
        JobStatus::Settled,
    ];

    /// Settled and Expired accept no further lifecycle transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Settled | JobStatus::Expired)
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Open => "Open",
            JobStatus::Assigned => "Assigned",
            JobStatus::CompletionRequested => "CompletionRequested",
            JobStatus::Disputed => "Disputed",
            JobStatus::Expired => "Expired",
            JobStatus::Settled => "Settled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Record of work accepted as complete, issued to the agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCertificate {
    pub token_id: u64,
    pub job_id: JobId,
    pub agent: Address,
    pub completion_uri: Option<SafeUri>,
    pub issued_at: Timestamp,
}
