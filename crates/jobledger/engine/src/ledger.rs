//! Job Ledger: the facade every operation goes through
//!
//! Each mutating method runs its checks in the same order: circuit breaker,
//! caller's role, job lookup, transition legality, then value. All checks
//! complete before the first write, so a rejected call changes nothing.

use crate::clock::CallContext;
use crate::controller::{CertificateBook, CircuitBreaker, Treasury};
use crate::disputes::{self, Vote, VoteEffect};
use crate::economics::{self, Settlement};
use crate::journal::EventJournal;
use crate::lifecycle::{self, Deadlines, ExpiryKind};
use crate::registry::{JobRegistry, JobSlot};
use crate::roles::{Role, RoleRegistry};
use jobledger_types::{
    Address, Admission, Amount, Bps, CompletionCertificate, EconomicsConfig, Job, JobCore, JobId,
    JobStatus, JobValidation, LedgerConfig, LedgerError, LedgerEvent, LedgerResult, Parameter,
    QuorumConfig, ResolutionCode, ReviewConfig, SafeUri, MAX_NOTE_LEN, MAX_REASON_LEN,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Value handed to an address by `claim` or `withdrawAGI`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub to: Address,
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLedger {
    roles: RoleRegistry,
    registry: JobRegistry,
    breaker: CircuitBreaker,
    treasury: Treasury,
    certificates: CertificateBook,
    review: ReviewConfig,
    quorum: QuorumConfig,
    economics: EconomicsConfig,
    journal: EventJournal,
}

impl JobLedger {
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;

        info!(
            owner = %config.owner,
            next_job_id = config.next_job_id,
            "Job ledger initialized"
        );

        Ok(Self {
            roles: RoleRegistry::new(config.owner, config.identity),
            registry: JobRegistry::new(config.next_job_id),
            breaker: CircuitBreaker::default(),
            treasury: Treasury::new(),
            certificates: CertificateBook::new(),
            review: config.review,
            quorum: config.quorum,
            economics: config.economics,
            journal: EventJournal::new(),
        })
    }

    // --- Job registry ---

    /// Escrow `payout` from the caller and publish a new open job.
    pub fn create_job(
        &mut self,
        ctx: &CallContext,
        payout: Amount,
        duration: u64,
        spec_uri: &str,
        details: &str,
    ) -> LedgerResult<JobId> {
        self.breaker.ensure_active()?;
        require_caller(ctx)?;
        self.roles.require_not_blacklisted(&ctx.caller)?;

        if payout.is_zero() {
            return Err(LedgerError::InvalidParameters(
                "payout must be positive".into(),
            ));
        }
        if duration == 0 {
            return Err(LedgerError::InvalidParameters(
                "duration must be positive".into(),
            ));
        }
        let spec_uri = SafeUri::parse(spec_uri)?;
        if details.len() > MAX_NOTE_LEN {
            return Err(LedgerError::InvalidParameters(format!(
                "details exceed {} bytes",
                MAX_NOTE_LEN
            )));
        }

        let id = self.registry.next_job_id()?;
        self.treasury.check_deposit(payout)?;

        let spec_text = spec_uri.to_string();
        let job = Job::new(id, ctx.caller, payout, duration, spec_uri, details, ctx.now);
        self.registry.insert(job)?;
        self.treasury.deposit(payout)?;

        info!(
            job_id = %id,
            employer = %ctx.caller,
            payout = %payout,
            duration,
            "Job created"
        );
        self.journal.record(
            ctx.now,
            LedgerEvent::JobCreated {
                job_id: id,
                employer: ctx.caller,
                payout,
                duration,
                spec_uri: spec_text,
            },
        );

        Ok(id)
    }

    /// Take an open job. Locks the agent's stake.
    pub fn apply_for_job(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<()> {
        self.breaker.ensure_active()?;
        require_caller(ctx)?;
        self.roles.require_agent(&ctx.caller)?;

        let job = self.registry.get_mut(id)?;
        if job.core.employer == ctx.caller {
            return Err(LedgerError::NotAuthorized(format!(
                "employer cannot apply to own job {}",
                id
            )));
        }
        lifecycle::check_assignable(job)?;

        let stake = economics::bond(job.core.payout, self.economics.bond_bps);
        self.treasury.check_deposit(stake)?;

        lifecycle::assign(job, ctx.caller, ctx.now)?;
        job.escrow.agent_stake = stake;
        self.treasury.deposit(stake)?;

        info!(job_id = %id, agent = %ctx.caller, stake = %stake, "Job assigned");
        self.journal.record(
            ctx.now,
            LedgerEvent::JobApplied {
                job_id: id,
                agent: ctx.caller,
                stake,
            },
        );
        Ok(())
    }

    /// Employer withdraws an open job and gets the payout back.
    pub fn cancel_job(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<()> {
        self.breaker.ensure_settlement_open()?;

        let job = self.registry.get(id)?;
        if job.core.employer != ctx.caller {
            return Err(LedgerError::NotAuthorized(format!(
                "only the employer may cancel job {}",
                id
            )));
        }
        if job.status() != JobStatus::Open {
            return Err(LedgerError::InvalidState(format!(
                "job {} is {} and can no longer be cancelled",
                id,
                job.status()
            )));
        }

        let plan = economics::refund_without_penalty(job);
        self.registry.remove(id)?;
        self.treasury.disburse(&plan);

        info!(job_id = %id, refund = %plan.employer_refund, "Job cancelled");
        self.journal.record(
            ctx.now,
            LedgerEvent::JobCancelled {
                job_id: id,
                employer: ctx.caller,
                refund: plan.employer_refund,
            },
        );
        Ok(())
    }

    /// Moderator removal of a job. Anything still locked goes back to
    /// whoever put it in.
    pub fn delete_job(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<()> {
        self.breaker.ensure_active()?;
        self.roles.require_moderator(&ctx.caller)?;

        let job = self.registry.get(id)?;
        if !job.escrow.is_empty() {
            self.breaker.ensure_settlement_open()?;
        }

        let plan = economics::refund_without_penalty(job);
        self.registry.remove(id)?;
        self.treasury.disburse(&plan);

        let released = plan.total();
        warn!(job_id = %id, by = %ctx.caller, released = %released, "Job deleted");
        self.journal.record(
            ctx.now,
            LedgerEvent::JobDeleted {
                job_id: id,
                by: ctx.caller,
                released,
            },
        );
        Ok(())
    }

    // --- Lifecycle ---

    pub fn request_job_completion(
        &mut self,
        ctx: &CallContext,
        id: JobId,
        completion_uri: &str,
    ) -> LedgerResult<()> {
        self.breaker.ensure_active()?;
        self.roles.require_not_blacklisted(&ctx.caller)?;

        let job = self.registry.get_mut(id)?;
        lifecycle::check_completion_request(job, &ctx.caller, ctx.now)?;
        let uri = SafeUri::parse(completion_uri)?;
        let uri_text = uri.to_string();
        lifecycle::request_completion(job, &ctx.caller, uri, ctx.now)?;

        info!(job_id = %id, agent = %ctx.caller, "Completion requested");
        self.journal.record(
            ctx.now,
            LedgerEvent::JobCompletionRequested {
                job_id: id,
                agent: ctx.caller,
                completion_uri: uri_text,
            },
        );
        Ok(())
    }

    /// Approve a job under review.
    pub fn validate_job(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<VoteEffect> {
        self.vote(ctx, id, Vote::Approve)
    }

    /// Disapprove a job under review.
    pub fn disapprove_job(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<VoteEffect> {
        self.vote(ctx, id, Vote::Disapprove)
    }

    fn vote(&mut self, ctx: &CallContext, id: JobId, vote: Vote) -> LedgerResult<VoteEffect> {
        self.breaker.ensure_active()?;
        require_caller(ctx)?;
        self.roles.require_validator(&ctx.caller)?;

        let job = self.registry.get_mut(id)?;
        let effect = disputes::cast_vote(
            job,
            ctx.caller,
            vote,
            ctx.now,
            &self.review,
            &self.quorum,
        )?;

        let event = match vote {
            Vote::Approve => LedgerEvent::JobValidated {
                job_id: id,
                validator: ctx.caller,
                approvals: job.validation.approvals,
            },
            Vote::Disapprove => LedgerEvent::JobDisapproved {
                job_id: id,
                validator: ctx.caller,
                disapprovals: job.validation.disapprovals,
            },
        };
        self.journal.record(ctx.now, event);

        match effect {
            VoteEffect::QuorumReached { approvals } => {
                if self.breaker.settlement_paused() {
                    info!(
                        job_id = %id,
                        approvals,
                        "Quorum reached while settlement is paused, settlement deferred"
                    );
                } else {
                    self.settle_completed(ctx, id)?;
                }
            }
            VoteEffect::DisputeRaised { disapprovals } => {
                warn!(job_id = %id, disapprovals, "Disapproval threshold reached, job disputed");
                self.journal.record(
                    ctx.now,
                    LedgerEvent::JobDisputed {
                        job_id: id,
                        disputant: None,
                        bond: Amount::ZERO,
                    },
                );
            }
            VoteEffect::Recorded { .. } => {}
        }
        Ok(effect)
    }

    /// Contest a job under review. Locks a bond from the disputant.
    pub fn dispute_job(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<Amount> {
        self.breaker.ensure_active()?;
        require_caller(ctx)?;
        self.roles.require_not_blacklisted(&ctx.caller)?;

        let job = self.registry.get(id)?;
        if job.core.assigned_agent == ctx.caller {
            return Err(LedgerError::NotAuthorized(format!(
                "the agent cannot dispute job {}",
                id
            )));
        }
        if job.core.employer != ctx.caller && !self.roles.is_validator(&ctx.caller) {
            return Err(LedgerError::NotAuthorized(format!(
                "{} is neither the employer nor a validator",
                ctx.caller
            )));
        }
        lifecycle::check_dispute(job, ctx.now, &self.review)?;

        let bond = economics::bond(job.core.payout, self.economics.bond_bps);
        self.treasury.check_deposit(bond)?;

        let job = self.registry.get_mut(id)?;
        lifecycle::open_dispute(job, Some(ctx.caller), ctx.now);
        job.escrow.dispute_bond = bond;
        self.treasury.deposit(bond)?;

        warn!(job_id = %id, disputant = %ctx.caller, bond = %bond, "Job disputed");
        self.journal.record(
            ctx.now,
            LedgerEvent::JobDisputed {
                job_id: id,
                disputant: Some(ctx.caller),
                bond,
            },
        );
        Ok(bond)
    }

    /// Close a dispute with a resolution code.
    pub fn resolve_dispute_with_code(
        &mut self,
        ctx: &CallContext,
        id: JobId,
        code: u8,
        agent_share_bps: Option<u16>,
        reason: &str,
    ) -> LedgerResult<ResolutionCode> {
        self.breaker.ensure_settlement_open()?;
        self.roles.require_moderator(&ctx.caller)?;

        let resolution = ResolutionCode::from_raw(code, agent_share_bps)?;
        if reason.len() > MAX_REASON_LEN {
            return Err(LedgerError::InvalidParameters(format!(
                "reason exceeds {} bytes",
                MAX_REASON_LEN
            )));
        }

        let job = self.registry.get_mut(id)?;
        let plan = disputes::resolution_settlement(job, resolution, &self.economics)?;
        let agent = job.core.assigned_agent;
        lifecycle::mark_settled(job);
        self.treasury.disburse(&plan);

        info!(
            job_id = %id,
            resolver = %ctx.caller,
            resolution = resolution.name(),
            "Dispute resolved"
        );
        self.journal.record(
            ctx.now,
            LedgerEvent::DisputeResolvedWithCode {
                job_id: id,
                resolver: ctx.caller,
                code: resolution.code(),
                reason: reason.to_string(),
            },
        );
        self.record_completion(ctx, id, agent, &plan);

        if resolution == ResolutionCode::AgentWins {
            self.issue_certificate(ctx, id)?;
        }
        Ok(resolution)
    }

    /// Settle a job whose approvals already reached quorum.
    pub fn finalize_job(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<()> {
        self.breaker.ensure_settlement_open()?;

        let job = self.registry.get(id)?;
        if !lifecycle::quorum_reached(job) {
            return Err(LedgerError::InvalidState(format!(
                "job {} did not reach quorum during review ({} approvals)",
                id, job.validation.approvals
            )));
        }
        self.settle_completed(ctx, id)
    }

    /// Close a job whose deadline lapsed. Anyone may call this.
    pub fn expire_job(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<ExpiryKind> {
        self.breaker.ensure_settlement_open()?;

        let job = self.registry.get_mut(id)?;
        let kind = lifecycle::expiry_due(job, ctx.now, &self.review).ok_or_else(
            || {
                LedgerError::InvalidState(format!(
                    "job {} is not eligible for expiry ({})",
                    id,
                    job.status()
                ))
            },
        )?;

        let plan = match kind {
            ExpiryKind::AssignmentLapsed => economics::refund_employer(job, &self.economics),
            ExpiryKind::ReviewLapsed => economics::refund_without_penalty(job),
        };
        lifecycle::mark_expired(job);
        self.treasury.disburse(&plan);

        info!(job_id = %id, kind = ?kind, slashed = %plan.slashed, "Job expired");
        self.journal.record(
            ctx.now,
            LedgerEvent::JobExpired {
                job_id: id,
                employer_refund: plan.employer_refund,
                slashed: plan.slashed,
            },
        );
        Ok(kind)
    }

    fn settle_completed(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<()> {
        let job = self.registry.get_mut(id)?;
        let plan = economics::pay_agent(job, &self.economics);
        let agent = job.core.assigned_agent;
        lifecycle::mark_settled(job);
        self.treasury.disburse(&plan);

        info!(job_id = %id, agent = %agent, payout = %plan.agent_payout, "Job completed");
        self.record_completion(ctx, id, agent, &plan);
        self.issue_certificate(ctx, id)
    }

    fn record_completion(&mut self, ctx: &CallContext, id: JobId, agent: Address, plan: &Settlement) {
        self.journal.record(
            ctx.now,
            LedgerEvent::JobCompleted {
                job_id: id,
                agent,
                agent_payout: plan.agent_payout,
                employer_refund: plan.employer_refund,
                fee: plan.fee,
                slashed: plan.slashed,
            },
        );
    }

    fn issue_certificate(&mut self, ctx: &CallContext, id: JobId) -> LedgerResult<()> {
        let job = self.registry.get(id)?;
        let certificate = self.certificates.issue(job, ctx.now);
        let event = LedgerEvent::CertificateIssued {
            token_id: certificate.token_id,
            job_id: id,
            agent: certificate.agent,
        };
        self.journal.record(ctx.now, event);
        Ok(())
    }

    // --- Circuit breaker ---

    /// Owner only. Pausing an already paused ledger is accepted.
    pub fn pause(&mut self, ctx: &CallContext) -> LedgerResult<bool> {
        self.roles.require_owner(&ctx.caller)?;
        let changed = self.breaker.set_paused(true);
        if changed {
            warn!(by = %ctx.caller, "Ledger paused");
            self.journal
                .record(ctx.now, LedgerEvent::Paused { by: ctx.caller });
        }
        Ok(changed)
    }

    /// Owner only. Unpausing a running ledger is accepted.
    pub fn unpause(&mut self, ctx: &CallContext) -> LedgerResult<bool> {
        self.roles.require_owner(&ctx.caller)?;
        let changed = self.breaker.set_paused(false);
        if changed {
            info!(by = %ctx.caller, "Ledger unpaused");
            self.journal
                .record(ctx.now, LedgerEvent::Unpaused { by: ctx.caller });
        }
        Ok(changed)
    }

    pub fn set_settlement_paused(&mut self, ctx: &CallContext, paused: bool) -> LedgerResult<bool> {
        self.roles.require_owner(&ctx.caller)?;
        let changed = self.breaker.set_settlement_paused(paused);
        if changed {
            warn!(by = %ctx.caller, paused, "Settlement pause changed");
            self.journal.record(
                ctx.now,
                LedgerEvent::SettlementPauseSet {
                    by: ctx.caller,
                    paused,
                },
            );
        }
        Ok(changed)
    }

    // --- Treasury ---

    /// Owner pulls every accrued fee and slash.
    pub fn withdraw_agi(&mut self, ctx: &CallContext) -> LedgerResult<Payment> {
        self.breaker.ensure_settlement_open()?;
        self.roles.require_owner(&ctx.caller)?;

        let amount = self.treasury.withdraw_all()?;

        info!(to = %ctx.caller, amount = %amount, "Treasury withdrawn");
        self.journal.record(
            ctx.now,
            LedgerEvent::TreasuryWithdrawn {
                to: ctx.caller,
                amount,
            },
        );
        Ok(Payment {
            to: ctx.caller,
            amount,
        })
    }

    /// Caller pulls everything credited to them.
    pub fn claim(&mut self, ctx: &CallContext) -> LedgerResult<Payment> {
        self.breaker.ensure_settlement_open()?;

        let amount = self.treasury.claim(&ctx.caller)?;

        info!(account = %ctx.caller, amount = %amount, "Funds claimed");
        self.journal.record(
            ctx.now,
            LedgerEvent::FundsClaimed {
                account: ctx.caller,
                amount,
            },
        );
        Ok(Payment {
            to: ctx.caller,
            amount,
        })
    }

    // --- Roles and identity ---

    pub fn grant_role(&mut self, ctx: &CallContext, role: Role, account: Address) -> LedgerResult<bool> {
        self.roles.grant(ctx, role, account, &mut self.journal)
    }

    pub fn revoke_role(&mut self, ctx: &CallContext, role: Role, account: Address) -> LedgerResult<bool> {
        self.roles.revoke(ctx, role, account, &mut self.journal)
    }

    pub fn grant_moderator(&mut self, ctx: &CallContext, account: Address) -> LedgerResult<bool> {
        self.grant_role(ctx, Role::Moderator, account)
    }

    pub fn revoke_moderator(&mut self, ctx: &CallContext, account: Address) -> LedgerResult<bool> {
        self.revoke_role(ctx, Role::Moderator, account)
    }

    pub fn grant_agent(&mut self, ctx: &CallContext, account: Address) -> LedgerResult<bool> {
        self.grant_role(ctx, Role::Agent, account)
    }

    pub fn revoke_agent(&mut self, ctx: &CallContext, account: Address) -> LedgerResult<bool> {
        self.revoke_role(ctx, Role::Agent, account)
    }

    pub fn grant_validator(&mut self, ctx: &CallContext, account: Address) -> LedgerResult<bool> {
        self.grant_role(ctx, Role::Validator, account)
    }

    pub fn revoke_validator(&mut self, ctx: &CallContext, account: Address) -> LedgerResult<bool> {
        self.revoke_role(ctx, Role::Validator, account)
    }

    pub fn blacklist(&mut self, ctx: &CallContext, account: Address) -> LedgerResult<bool> {
        self.roles.blacklist(ctx, account, &mut self.journal)
    }

    pub fn unblacklist(&mut self, ctx: &CallContext, account: Address) -> LedgerResult<bool> {
        self.roles.unblacklist(ctx, account, &mut self.journal)
    }

    pub fn transfer_ownership(&mut self, ctx: &CallContext, new_owner: Address) -> LedgerResult<()> {
        self.roles.transfer_ownership(ctx, new_owner, &mut self.journal)
    }

    pub fn set_identity_admission(
        &mut self,
        ctx: &CallContext,
        agents: Admission,
        validators: Admission,
    ) -> LedgerResult<()> {
        self.roles
            .set_identity_admission(ctx, agents, validators, &mut self.journal)
    }

    /// One-way. A repeat call is accepted and returns `false`.
    pub fn lock_identity_configuration(&mut self, ctx: &CallContext) -> LedgerResult<bool> {
        self.roles.lock_identity_configuration(ctx, &mut self.journal)
    }

    // --- Parameters ---

    pub fn set_parameter(
        &mut self,
        ctx: &CallContext,
        parameter: Parameter,
        value: u64,
    ) -> LedgerResult<()> {
        self.roles.require_owner(&ctx.caller)?;

        match parameter {
            Parameter::RequiredApprovals => {
                self.quorum.required_approvals = positive_count(parameter, value)?
            }
            Parameter::RequiredDisapprovals => {
                self.quorum.required_disapprovals = positive_count(parameter, value)?
            }
            Parameter::BondBps => self.economics.bond_bps = Bps::from_u64(value)?,
            Parameter::SlashBps => self.economics.slash_bps = Bps::from_u64(value)?,
            Parameter::FeeBps => self.economics.fee_bps = Bps::from_u64(value)?,
            Parameter::CompletionReviewPeriod => self.review.completion_review_period = value,
            Parameter::DisputeReviewPeriod => self.review.dispute_review_period = value,
        }

        info!(parameter = parameter.name(), value, "Parameter updated");
        self.journal.record(
            ctx.now,
            LedgerEvent::ParameterUpdated {
                parameter: parameter.name().to_string(),
                value,
            },
        );
        Ok(())
    }

    // --- Query methods ---

    pub fn owner(&self) -> Address {
        self.roles.owner()
    }

    pub fn paused(&self) -> bool {
        self.breaker.paused()
    }

    pub fn settlement_paused(&self) -> bool {
        self.breaker.settlement_paused()
    }

    pub fn identity_configuration_locked(&self) -> bool {
        self.roles.identity_locked()
    }

    /// Id the next `createJob` will allocate.
    pub fn next_job_id(&self) -> u64 {
        self.registry
            .next_job_id()
            .map(|id| id.value())
            .unwrap_or(u64::MAX)
    }

    pub fn job(&self, id: JobId) -> JobSlot<'_> {
        self.registry.slot(id)
    }

    pub fn get_job(&self, id: JobId) -> LedgerResult<&Job> {
        self.registry.get(id)
    }

    pub fn job_core(&self, id: JobId) -> LedgerResult<&JobCore> {
        self.registry.get(id).map(|job| &job.core)
    }

    pub fn job_validation(&self, id: JobId) -> LedgerResult<&JobValidation> {
        self.registry.get(id).map(|job| &job.validation)
    }

    /// Status as of `now`, with lapsed deadlines reported as Expired.
    pub fn status_at(&self, id: JobId, now: u64) -> LedgerResult<JobStatus> {
        let job = self.registry.get(id)?;
        Ok(lifecycle::status_at(job, now, &self.review))
    }

    pub fn deadlines(&self, id: JobId) -> LedgerResult<Deadlines> {
        let job = self.registry.get(id)?;
        Ok(lifecycle::compute_deadlines(job, &self.review))
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.registry.iter()
    }

    pub fn open_jobs(&self) -> impl Iterator<Item = &Job> {
        self.registry.open_jobs()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn completion_review_period(&self) -> u64 {
        self.review.completion_review_period
    }

    pub fn dispute_review_period(&self) -> u64 {
        self.review.dispute_review_period
    }

    pub fn quorum(&self) -> &QuorumConfig {
        &self.quorum
    }

    pub fn economics(&self) -> &EconomicsConfig {
        &self.economics
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    pub fn withdrawable_agi(&self) -> Amount {
        self.treasury.withdrawable()
    }

    pub fn claimable(&self, account: &Address) -> Amount {
        self.treasury.claimable(account)
    }

    pub fn certificates(&self) -> &[CompletionCertificate] {
        self.certificates.all()
    }

    pub fn certificates_of<'a>(
        &'a self,
        agent: &'a Address,
    ) -> impl Iterator<Item = &'a CompletionCertificate> + 'a {
        self.certificates.held_by(agent)
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// The treasury balances, and what it reports locked matches the sum of
    /// every live job's escrow.
    pub fn is_balanced(&self) -> bool {
        let escrowed = self
            .registry
            .iter()
            .try_fold(Amount::ZERO, |acc, job| acc.checked_add(job.escrow.total()));
        self.treasury.is_balanced() && escrowed == Some(self.treasury.locked())
    }

    /// Run `f` against a working copy and keep the result only on success.
    /// The journal is moved into the copy rather than cloned; on failure the
    /// entries `f` appended are rolled back and the journal moved home.
    pub(crate) fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut JobLedger) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mark = self.journal.next_sequence();
        let journal = std::mem::take(&mut self.journal);
        let mut working = self.clone();
        working.journal = journal;

        match f(&mut working) {
            Ok(value) => {
                *self = working;
                Ok(value)
            }
            Err(err) => {
                working.journal.rollback_to(mark);
                self.journal = working.journal;
                Err(err)
            }
        }
    }
}

fn require_caller(ctx: &CallContext) -> LedgerResult<()> {
    if ctx.caller.is_zero() {
        Err(LedgerError::NotAuthorized(
            "the zero address cannot act".into(),
        ))
    } else {
        Ok(())
    }
}

fn positive_count(parameter: Parameter, value: u64) -> LedgerResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            LedgerError::InvalidParameters(format!(
                "{} must be between 1 and {}",
                parameter.name(),
                u32::MAX
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    const OWNER: u8 = 1;
    const EMPLOYER: u8 = 2;
    const AGENT: u8 = 3;

    fn ctx(who: u8, now: u64) -> CallContext {
        CallContext::new(addr(who), now)
    }

    fn setup() -> JobLedger {
        let mut config = LedgerConfig::new(addr(OWNER));
        config.quorum.required_approvals = 2;
        config.economics.fee_bps = Bps::ZERO;
        let mut ledger = JobLedger::new(config).unwrap();
        for v in [10, 11, 12] {
            ledger
                .grant_role(&ctx(OWNER, 0), Role::Validator, addr(v))
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_create_then_read() {
        let mut ledger = setup();
        let id = ledger
            .create_job(&ctx(EMPLOYER, 5), Amount::new(10_000), 3_600, "https://jobs.example/a", "logo design")
            .unwrap();

        assert_eq!(id, JobId(0));
        assert_eq!(ledger.next_job_id(), 1);
        let core = ledger.job_core(id).unwrap();
        assert!(core.assigned_agent.is_zero());
        assert!(!core.completed && !core.disputed && !core.expired);
        assert_eq!(core.payout, Amount::new(10_000));
        assert_eq!(core.duration, 3_600);
        assert_eq!(
            ledger.get_job(id).unwrap().spec_uri.as_str(),
            "https://jobs.example/a"
        );
        assert_eq!(ledger.journal().entries()[3].event.name(), "JobCreated");
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let mut ledger = setup();
        let c = ctx(EMPLOYER, 5);
        for (payout, duration, uri) in [
            (0u128, 10u64, "https://x.example"),
            (10, 0, "https://x.example"),
            (10, 10, "javascript:alert(1)"),
            (10, 10, "data:text/html,hi"),
            (10, 10, " https://x.example"),
        ] {
            let err = ledger
                .create_job(&c, Amount::new(payout), duration, uri, "")
                .unwrap_err();
            assert!(matches!(err, LedgerError::InvalidParameters(_)), "{uri}");
        }
        assert_eq!(ledger.next_job_id(), 0);
    }

    #[test]
    fn test_happy_path_settles_by_quorum() {
        let mut ledger = setup();
        let id = ledger
            .create_job(&ctx(EMPLOYER, 0), Amount::new(10_000), 100, "ipfs://QmSpec", "")
            .unwrap();
        ledger.apply_for_job(&ctx(AGENT, 1), id).unwrap();
        assert_eq!(ledger.get_job(id).unwrap().escrow.agent_stake, Amount::new(500));

        ledger
            .request_job_completion(&ctx(AGENT, 2), id, "ipfs://QmDone")
            .unwrap();
        ledger.validate_job(&ctx(10, 3), id).unwrap();
        let effect = ledger.validate_job(&ctx(11, 4), id).unwrap();
        assert_eq!(effect, VoteEffect::QuorumReached { approvals: 2 });

        assert_eq!(ledger.get_job(id).unwrap().status(), JobStatus::Settled);
        assert_eq!(ledger.claimable(&addr(AGENT)), Amount::new(10_500));
        assert_eq!(ledger.certificates().len(), 1);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_pause_blocks_mutations() {
        let mut ledger = setup();
        assert!(ledger.pause(&ctx(OWNER, 1)).unwrap());
        assert!(!ledger.pause(&ctx(OWNER, 2)).unwrap());
        assert!(ledger.paused());

        let err = ledger
            .create_job(&ctx(EMPLOYER, 3), Amount::new(1), 1, "https://x.example", "")
            .unwrap_err();
        assert_eq!(err, LedgerError::Paused);

        assert!(ledger.pause(&ctx(EMPLOYER, 3)).is_err());
        assert!(ledger.unpause(&ctx(OWNER, 4)).unwrap());
        assert!(!ledger.unpause(&ctx(OWNER, 5)).unwrap());
    }

    #[test]
    fn test_set_parameter() {
        let mut ledger = setup();
        ledger
            .set_parameter(&ctx(OWNER, 0), Parameter::BondBps, 250)
            .unwrap();
        assert_eq!(ledger.economics().bond_bps.get(), 250);

        assert!(matches!(
            ledger.set_parameter(&ctx(OWNER, 0), Parameter::FeeBps, 10_001),
            Err(LedgerError::InvalidParameters(_))
        ));
        assert!(matches!(
            ledger.set_parameter(&ctx(OWNER, 0), Parameter::RequiredApprovals, 0),
            Err(LedgerError::InvalidParameters(_))
        ));
        assert!(matches!(
            ledger.set_parameter(&ctx(EMPLOYER, 0), Parameter::SlashBps, 1),
            Err(LedgerError::NotAuthorized(_))
        ));
    }

    #[test]
    fn test_serde_snapshot() {
        let mut ledger = setup();
        ledger
            .create_job(&ctx(EMPLOYER, 0), Amount::new(77), 10, "ens://work.eth", "")
            .unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        let back: JobLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
