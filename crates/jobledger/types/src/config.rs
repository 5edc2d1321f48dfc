//! Ledger configuration
//!
//! The initial platform parameters. Every section has serde defaults so a
//! config file only needs to name the owner.

use crate::{Address, Bps, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// Complete ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub owner: Address,
    /// First id handed out by `createJob`
    #[serde(default)]
    pub next_job_id: u64,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub quorum: QuorumConfig,
    #[serde(default)]
    pub economics: EconomicsConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl LedgerConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            next_job_id: 0,
            review: ReviewConfig::default(),
            quorum: QuorumConfig::default(),
            economics: EconomicsConfig::default(),
            identity: IdentityConfig::default(),
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.owner.is_zero() {
            return Err(LedgerError::InvalidParameters(
                "owner must not be the zero address".into(),
            ));
        }
        if self.quorum.required_approvals == 0 {
            return Err(LedgerError::InvalidParameters(
                "required approvals must be at least 1".into(),
            ));
        }
        if self.quorum.required_disapprovals == 0 {
            return Err(LedgerError::InvalidParameters(
                "required disapprovals must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Review windows, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// How long validators have to vote once completion is requested
    pub completion_review_period: u64,
    /// How long validators may add votes to an open dispute
    pub dispute_review_period: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            completion_review_period: 7 * 24 * 60 * 60,
            dispute_review_period: 14 * 24 * 60 * 60,
        }
    }
}

/// Vote thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuorumConfig {
    /// Approvals that settle a completion request
    pub required_approvals: u32,
    /// Disapprovals that turn a completion request into a dispute
    pub required_disapprovals: u32,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            required_approvals: 3,
            required_disapprovals: 3,
        }
    }
}

/// Basis-point parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicsConfig {
    /// Agent stake at assignment and disputant bond, as a share of payout
    pub bond_bps: Bps,
    /// Share of the agent stake forfeited on an adverse outcome
    pub slash_bps: Bps,
    /// Platform fee on the agent's payout
    pub fee_bps: Bps,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            bond_bps: Bps::new(500).unwrap_or(Bps::ZERO),
            slash_bps: Bps::new(1_000).unwrap_or(Bps::ZERO),
            fee_bps: Bps::new(100).unwrap_or(Bps::ZERO),
        }
    }
}

/// How an address qualifies for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// Any non-blacklisted address qualifies
    Open,
    /// Only addresses the owner granted
    Allowlist,
}

impl Admission {
    pub fn is_open(&self) -> bool {
        matches!(self, Admission::Open)
    }
}

/// Identity admission policy. Frozen by `lockIdentityConfiguration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub agents: Admission,
    pub validators: Admission,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            agents: Admission::Open,
            validators: Admission::Allowlist,
        }
    }
}

/// Owner-settable numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    RequiredApprovals,
    RequiredDisapprovals,
    BondBps,
    SlashBps,
    FeeBps,
    CompletionReviewPeriod,
    DisputeReviewPeriod,
}

impl Parameter {
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::RequiredApprovals => "requiredApprovals",
            Parameter::RequiredDisapprovals => "requiredDisapprovals",
            Parameter::BondBps => "bondBps",
            Parameter::SlashBps => "slashBps",
            Parameter::FeeBps => "feeBps",
            Parameter::CompletionReviewPeriod => "completionReviewPeriod",
            Parameter::DisputeReviewPeriod => "disputeReviewPeriod",
        }
    }
}
