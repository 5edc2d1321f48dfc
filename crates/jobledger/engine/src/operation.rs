//! Operations as data, and the pure transition function
//!
//! [`step`] maps `(ledger, call)` to a new ledger plus a [`Receipt`], never
//! touching its input. [`JobLedger::apply`] is `step` followed by a swap, so
//! a rejected call leaves the ledger exactly as it was.
//!
//! Operation tags are the ledger's public write-surface names:
//!
//! ```json
//! { "caller": "0x…", "at": 1700000000, "op": "createJob",
//!   "payout": "10000", "duration": 86400, "specUri": "ipfs://…" }
//! ```

use crate::clock::CallContext;
use crate::ledger::{JobLedger, Payment};
use crate::roles::Role;
use jobledger_types::{
    Address, Admission, Amount, JobId, JournalEntry, LedgerResult, Parameter, Timestamp,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    CreateJob {
        payout: Amount,
        duration: u64,
        spec_uri: String,
        #[serde(default)]
        details: String,
    },
    ApplyForJob {
        job_id: JobId,
    },
    RequestJobCompletion {
        job_id: JobId,
        completion_uri: String,
    },
    ValidateJob {
        job_id: JobId,
    },
    DisapproveJob {
        job_id: JobId,
    },
    DisputeJob {
        job_id: JobId,
    },
    ResolveDisputeWithCode {
        job_id: JobId,
        code: u8,
        #[serde(default)]
        agent_share_bps: Option<u16>,
        #[serde(default)]
        reason: String,
    },
    FinalizeJob {
        job_id: JobId,
    },
    ExpireJob {
        job_id: JobId,
    },
    CancelJob {
        job_id: JobId,
    },
    DeleteJob {
        job_id: JobId,
    },
    Pause,
    Unpause,
    SetSettlementPaused {
        paused: bool,
    },
    LockIdentityConfiguration,
    SetIdentityAdmission {
        agents: Admission,
        validators: Admission,
    },
    #[serde(rename = "withdrawAGI")]
    WithdrawAgi,
    Claim,
    GrantRole {
        role: Role,
        account: Address,
    },
    RevokeRole {
        role: Role,
        account: Address,
    },
    Blacklist {
        account: Address,
    },
    Unblacklist {
        account: Address,
    },
    TransferOwnership {
        new_owner: Address,
    },
    SetParameter {
        parameter: Parameter,
        value: u64,
    },
}

impl Operation {
    /// Write-surface name, identical to the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateJob { .. } => "createJob",
            Operation::ApplyForJob { .. } => "applyForJob",
            Operation::RequestJobCompletion { .. } => "requestJobCompletion",
            Operation::ValidateJob { .. } => "validateJob",
            Operation::DisapproveJob { .. } => "disapproveJob",
            Operation::DisputeJob { .. } => "disputeJob",
            Operation::ResolveDisputeWithCode { .. } => "resolveDisputeWithCode",
            Operation::FinalizeJob { .. } => "finalizeJob",
            Operation::ExpireJob { .. } => "expireJob",
            Operation::CancelJob { .. } => "cancelJob",
            Operation::DeleteJob { .. } => "deleteJob",
            Operation::Pause => "pause",
            Operation::Unpause => "unpause",
            Operation::SetSettlementPaused { .. } => "setSettlementPaused",
            Operation::LockIdentityConfiguration => "lockIdentityConfiguration",
            Operation::SetIdentityAdmission { .. } => "setIdentityAdmission",
            Operation::WithdrawAgi => "withdrawAGI",
            Operation::Claim => "claim",
            Operation::GrantRole { .. } => "grantRole",
            Operation::RevokeRole { .. } => "revokeRole",
            Operation::Blacklist { .. } => "blacklist",
            Operation::Unblacklist { .. } => "unblacklist",
            Operation::TransferOwnership { .. } => "transferOwnership",
            Operation::SetParameter { .. } => "setParameter",
        }
    }
}

/// One serialized call: who, when, what.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub caller: Address,
    pub at: Timestamp,
    #[serde(flatten)]
    pub op: Operation,
}

impl Call {
    pub fn new(caller: Address, at: Timestamp, op: Operation) -> Self {
        Self { caller, at, op }
    }

    pub fn context(&self) -> CallContext {
        CallContext::new(self.caller, self.at)
    }
}

/// Result value of an accepted call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// State changed
    Applied,
    /// Accepted, but an idempotent call found nothing to change
    Unchanged,
    JobCreated { job_id: JobId },
    Paid { to: Address, amount: Amount },
}

impl Outcome {
    fn changed(changed: bool) -> Self {
        if changed {
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }
}

impl From<Payment> for Outcome {
    fn from(payment: Payment) -> Self {
        Outcome::Paid {
            to: payment.to,
            amount: payment.amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub outcome: Outcome,
    /// Journal entries the call appended
    pub events: Vec<JournalEntry>,
}

/// Pure transition: the next ledger state and a receipt, or the error.
pub fn step(ledger: &JobLedger, call: &Call) -> LedgerResult<(JobLedger, Receipt)> {
    let mut next = ledger.clone();
    let receipt = next.dispatch(call)?;
    Ok((next, receipt))
}

impl JobLedger {
    /// Apply one call atomically. Unlike [`step`] the journal is not copied,
    /// so long replays stay linear in the number of events.
    pub fn apply(&mut self, call: &Call) -> LedgerResult<Receipt> {
        self.transact(|ledger| ledger.dispatch(call))
    }

    fn dispatch(&mut self, call: &Call) -> LedgerResult<Receipt> {
        let ctx = call.context();
        let from = self.journal().next_sequence();

        let outcome = match &call.op {
            Operation::CreateJob {
                payout,
                duration,
                spec_uri,
                details,
            } => Outcome::JobCreated {
                job_id: self.create_job(&ctx, *payout, *duration, spec_uri, details)?,
            },
            Operation::ApplyForJob { job_id } => {
                self.apply_for_job(&ctx, *job_id)?;
                Outcome::Applied
            }
            Operation::RequestJobCompletion {
                job_id,
                completion_uri,
            } => {
                self.request_job_completion(&ctx, *job_id, completion_uri)?;
                Outcome::Applied
            }
            Operation::ValidateJob { job_id } => {
                self.validate_job(&ctx, *job_id)?;
                Outcome::Applied
            }
            Operation::DisapproveJob { job_id } => {
                self.disapprove_job(&ctx, *job_id)?;
                Outcome::Applied
            }
            Operation::DisputeJob { job_id } => {
                self.dispute_job(&ctx, *job_id)?;
                Outcome::Applied
            }
            Operation::ResolveDisputeWithCode {
                job_id,
                code,
                agent_share_bps,
                reason,
            } => {
                self.resolve_dispute_with_code(&ctx, *job_id, *code, *agent_share_bps, reason)?;
                Outcome::Applied
            }
            Operation::FinalizeJob { job_id } => {
                self.finalize_job(&ctx, *job_id)?;
                Outcome::Applied
            }
            Operation::ExpireJob { job_id } => {
                self.expire_job(&ctx, *job_id)?;
                Outcome::Applied
            }
            Operation::CancelJob { job_id } => {
                self.cancel_job(&ctx, *job_id)?;
                Outcome::Applied
            }
            Operation::DeleteJob { job_id } => {
                self.delete_job(&ctx, *job_id)?;
                Outcome::Applied
            }
            Operation::Pause => Outcome::changed(self.pause(&ctx)?),
            Operation::Unpause => Outcome::changed(self.unpause(&ctx)?),
            Operation::SetSettlementPaused { paused } => {
                Outcome::changed(self.set_settlement_paused(&ctx, *paused)?)
            }
            Operation::LockIdentityConfiguration => {
                Outcome::changed(self.lock_identity_configuration(&ctx)?)
            }
            Operation::SetIdentityAdmission { agents, validators } => {
                self.set_identity_admission(&ctx, *agents, *validators)?;
                Outcome::Applied
            }
            Operation::WithdrawAgi => self.withdraw_agi(&ctx)?.into(),
            Operation::Claim => self.claim(&ctx)?.into(),
            Operation::GrantRole { role, account } => {
                Outcome::changed(self.grant_role(&ctx, *role, *account)?)
            }
            Operation::RevokeRole { role, account } => {
                Outcome::changed(self.revoke_role(&ctx, *role, *account)?)
            }
            Operation::Blacklist { account } => Outcome::changed(self.blacklist(&ctx, *account)?),
            Operation::Unblacklist { account } => {
                Outcome::changed(self.unblacklist(&ctx, *account)?)
            }
            Operation::TransferOwnership { new_owner } => {
                self.transfer_ownership(&ctx, *new_owner)?;
                Outcome::Applied
            }
            Operation::SetParameter { parameter, value } => {
                self.set_parameter(&ctx, *parameter, *value)?;
                Outcome::Applied
            }
        };

        Ok(Receipt {
            outcome,
            events: self.journal().since(from).to_vec(),
        })
    }
}
