//! Emitted records
//!
//! Consumers key on the event name, so [`LedgerEvent::name`] and the serde
//! tag are the same string and must not change.

use crate::{Address, Amount, JobId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    JobCreated {
        job_id: JobId,
        employer: Address,
        payout: Amount,
        duration: u64,
        spec_uri: String,
    },
    JobApplied {
        job_id: JobId,
        agent: Address,
        stake: Amount,
    },
    JobCompletionRequested {
        job_id: JobId,
        agent: Address,
        completion_uri: String,
    },
    JobValidated {
        job_id: JobId,
        validator: Address,
        approvals: u32,
    },
    JobDisapproved {
        job_id: JobId,
        validator: Address,
        disapprovals: u32,
    },
    JobDisputed {
        job_id: JobId,
        /// `None` when raised by the disapproval threshold
        disputant: Option<Address>,
        bond: Amount,
    },
    DisputeResolvedWithCode {
        job_id: JobId,
        resolver: Address,
        code: u8,
        reason: String,
    },
    JobCompleted {
        job_id: JobId,
        agent: Address,
        agent_payout: Amount,
        employer_refund: Amount,
        fee: Amount,
        slashed: Amount,
    },
    CertificateIssued {
        token_id: u64,
        job_id: JobId,
        agent: Address,
    },
    JobExpired {
        job_id: JobId,
        employer_refund: Amount,
        slashed: Amount,
    },
    JobCancelled {
        job_id: JobId,
        employer: Address,
        refund: Amount,
    },
    JobDeleted {
        job_id: JobId,
        by: Address,
        released: Amount,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
    SettlementPauseSet {
        by: Address,
        paused: bool,
    },
    IdentityConfigurationLocked {
        by: Address,
    },
    IdentityAdmissionUpdated {
        agents_open: bool,
        validators_open: bool,
    },
    ModeratorGranted {
        account: Address,
    },
    ModeratorRevoked {
        account: Address,
    },
    AgentGranted {
        account: Address,
    },
    AgentRevoked {
        account: Address,
    },
    ValidatorGranted {
        account: Address,
    },
    ValidatorRevoked {
        account: Address,
    },
    Blacklisted {
        account: Address,
    },
    Unblacklisted {
        account: Address,
    },
    ParameterUpdated {
        parameter: String,
        value: u64,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    TreasuryWithdrawn {
        to: Address,
        amount: Amount,
    },
    FundsClaimed {
        account: Address,
        amount: Amount,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::JobCreated { .. } => "JobCreated",
            LedgerEvent::JobApplied { .. } => "JobApplied",
            LedgerEvent::JobCompletionRequested { .. } => "JobCompletionRequested",
            LedgerEvent::JobValidated { .. } => "JobValidated",
            LedgerEvent::JobDisapproved { .. } => "JobDisapproved",
            LedgerEvent::JobDisputed { .. } => "JobDisputed",
            LedgerEvent::DisputeResolvedWithCode { .. } => "DisputeResolvedWithCode",
            LedgerEvent::JobCompleted { .. } => "JobCompleted",
            LedgerEvent::CertificateIssued { .. } => "CertificateIssued",
            LedgerEvent::JobExpired { .. } => "JobExpired",
            LedgerEvent::JobCancelled { .. } => "JobCancelled",
            LedgerEvent::JobDeleted { .. } => "JobDeleted",
            LedgerEvent::Paused { .. } => "Paused",
            LedgerEvent::Unpaused { .. } => "Unpaused",
            LedgerEvent::SettlementPauseSet { .. } => "SettlementPauseSet",
            LedgerEvent::IdentityConfigurationLocked { .. } => "IdentityConfigurationLocked",
            LedgerEvent::IdentityAdmissionUpdated { .. } => "IdentityAdmissionUpdated",
            LedgerEvent::ModeratorGranted { .. } => "ModeratorGranted",
            LedgerEvent::ModeratorRevoked { .. } => "ModeratorRevoked",
            LedgerEvent::AgentGranted { .. } => "AgentGranted",
            LedgerEvent::AgentRevoked { .. } => "AgentRevoked",
            LedgerEvent::ValidatorGranted { .. } => "ValidatorGranted",
            LedgerEvent::ValidatorRevoked { .. } => "ValidatorRevoked",
            LedgerEvent::Blacklisted { .. } => "Blacklisted",
            LedgerEvent::Unblacklisted { .. } => "Unblacklisted",
            LedgerEvent::ParameterUpdated { .. } => "ParameterUpdated",
            LedgerEvent::OwnershipTransferred { .. } => "OwnershipTransferred",
            LedgerEvent::TreasuryWithdrawn { .. } => "TreasuryWithdrawn",
            LedgerEvent::FundsClaimed { .. } => "FundsClaimed",
        }
    }

    /// The job this event concerns, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            LedgerEvent::JobCreated { job_id, .. }
            | LedgerEvent::JobApplied { job_id, .. }
            | LedgerEvent::JobCompletionRequested { job_id, .. }
            | LedgerEvent::JobValidated { job_id, .. }
            | LedgerEvent::JobDisapproved { job_id, .. }
            | LedgerEvent::JobDisputed { job_id, .. }
            | LedgerEvent::DisputeResolvedWithCode { job_id, .. }
            | LedgerEvent::JobCompleted { job_id, .. }
            | LedgerEvent::CertificateIssued { job_id, .. }
            | LedgerEvent::JobExpired { job_id, .. }
            | LedgerEvent::JobCancelled { job_id, .. }
            | LedgerEvent::JobDeleted { job_id, .. } => Some(*job_id),
            _ => None,
        }
    }
}

/// An event as recorded in the ledger's append-only journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub at: Timestamp,
    #[serde(flatten)]
    pub event: LedgerEvent,
}
