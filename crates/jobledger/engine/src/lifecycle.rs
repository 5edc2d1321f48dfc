//! Job Lifecycle State Machine
//!
//! Transition rules for a single job. Nothing here runs on a timer: deadlines
//! are derived from stored timestamps and compared against the time of the
//! call that is currently executing.
//!
//! ```text
//! Open ──apply──▶ Assigned ──request──▶ CompletionRequested ──quorum──▶ Settled
//!                    │                     │      │
//!                    │ deadline            │      └─dispute / disapprovals─▶ Disputed ──resolve──▶ Settled
//!                    ▼                     ▼ review deadline
//!                 Expired               Expired
//! ```
//!
//! These functions check job-level legality only. Roles, the circuit breaker
//! and value movement are the caller's concern.

use jobledger_types::{
    Address, Job, JobStatus, LedgerError, LedgerResult, ReviewConfig, SafeUri, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Deadlines in force for a job at its current stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadlines {
    /// When the job becomes eligible for expiry; `None` when it cannot expire
    pub expiry_time: Option<Timestamp>,
    /// Last moment validators may still vote on a dispute
    pub dispute_deadline: Option<Timestamp>,
}

/// Which deadline lapsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryKind {
    /// The agent never requested completion in time
    AssignmentLapsed,
    /// Validators never reached quorum in time
    ReviewLapsed,
}

/// Derive the deadlines for a job.
///
/// While completion is pending, expiry is `completion_requested_at +
/// completion_review_period`; otherwise it is `assigned_at + duration`. A
/// zero window yields the reference timestamp itself, so the job is eligible
/// at that instant. Open, disputed and terminal jobs have no expiry time.
pub fn compute_deadlines(job: &Job, review: &ReviewConfig) -> Deadlines {
    let status = job.status();
    let expiry_time = match status {
        JobStatus::CompletionRequested => Some(
            job.validation
                .completion_requested_at
                .saturating_add(review.completion_review_period),
        ),
        JobStatus::Assigned => Some(job.core.assigned_at.saturating_add(job.core.duration)),
        _ => None,
    };
    let dispute_deadline = (status == JobStatus::Disputed).then(|| {
        job.validation
            .disputed_at
            .saturating_add(review.dispute_review_period)
    });

    Deadlines {
        expiry_time,
        dispute_deadline,
    }
}

/// A vote before the review deadline met quorum; the job waits for
/// settlement. Later changes to the quorum parameter do not move this.
pub fn quorum_reached(job: &Job) -> bool {
    job.status() == JobStatus::CompletionRequested && job.validation.quorum_reached_at.is_some()
}

/// Record that the deciding approval landed at `now`.
pub fn mark_quorum_reached(job: &mut Job, now: Timestamp) {
    if job.validation.quorum_reached_at.is_none() {
        job.validation.quorum_reached_at = Some(now);
    }
}

/// Whether the job may be expired at `now`, and why.
///
/// A job whose approvals already reached quorum is never expirable: it is
/// owed a settlement, not a refund.
pub fn expiry_due(job: &Job, now: Timestamp, review: &ReviewConfig) -> Option<ExpiryKind> {
    if quorum_reached(job) {
        return None;
    }
    let expiry_time = compute_deadlines(job, review).expiry_time?;
    if now < expiry_time {
        return None;
    }
    match job.status() {
        JobStatus::Assigned => Some(ExpiryKind::AssignmentLapsed),
        JobStatus::CompletionRequested => Some(ExpiryKind::ReviewLapsed),
        _ => None,
    }
}

/// Status as of `now`, counting a lapsed deadline as Expired.
pub fn status_at(job: &Job, now: Timestamp, review: &ReviewConfig) -> JobStatus {
    if expiry_due(job, now, review).is_some() {
        JobStatus::Expired
    } else {
        job.status()
    }
}

fn require_status(job: &Job, expected: JobStatus, action: &str) -> LedgerResult<()> {
    let status = job.status();
    if status == expected {
        Ok(())
    } else {
        Err(LedgerError::InvalidState(format!(
            "cannot {} job {} while {}",
            action, job.id, status
        )))
    }
}

/// Check that the job can take an agent. Makes no changes.
pub fn check_assignable(job: &Job) -> LedgerResult<()> {
    if job.is_assigned() {
        return Err(LedgerError::InvalidState(format!(
            "job {} is already assigned",
            job.id
        )));
    }
    require_status(job, JobStatus::Open, "assign")
}

/// Open → Assigned.
pub fn assign(job: &mut Job, agent: Address, now: Timestamp) -> LedgerResult<()> {
    check_assignable(job)?;

    job.core.assigned_agent = agent;
    job.core.assigned_at = now;
    Ok(())
}

/// Check that `caller` may request completion now. Makes no changes.
pub fn check_completion_request(job: &Job, caller: &Address, now: Timestamp) -> LedgerResult<()> {
    if !job.is_assigned() || job.core.assigned_agent != *caller {
        return Err(LedgerError::NotAuthorized(format!(
            "{} is not the agent assigned to job {}",
            caller, job.id
        )));
    }
    if job.validation.completion_requested {
        return Err(LedgerError::InvalidState(format!(
            "completion already requested for job {}",
            job.id
        )));
    }
    require_status(job, JobStatus::Assigned, "request completion for")?;

    let deadline = job.core.assigned_at.saturating_add(job.core.duration);
    if now >= deadline {
        return Err(LedgerError::InvalidState(format!(
            "job {} passed its assignment deadline at {}",
            job.id, deadline
        )));
    }
    Ok(())
}

/// Assigned → CompletionRequested.
pub fn request_completion(
    job: &mut Job,
    caller: &Address,
    completion_uri: SafeUri,
    now: Timestamp,
) -> LedgerResult<()> {
    check_completion_request(job, caller, now)?;

    job.validation.completion_requested = true;
    job.validation.completion_requested_at = now;
    job.completion_uri = Some(completion_uri);
    Ok(())
}

/// Check that a dispute may be raised on the job at `now`. Makes no changes.
pub fn check_dispute(job: &Job, now: Timestamp, review: &ReviewConfig) -> LedgerResult<()> {
    require_status(job, JobStatus::CompletionRequested, "dispute")?;
    if quorum_reached(job) {
        return Err(LedgerError::InvalidState(format!(
            "job {} already reached quorum and awaits settlement",
            job.id
        )));
    }
    if let Some(deadline) = compute_deadlines(job, review).expiry_time {
        if now >= deadline {
            return Err(LedgerError::InvalidState(format!(
                "review period for job {} ended at {}",
                job.id, deadline
            )));
        }
    }
    Ok(())
}

/// CompletionRequested → Disputed. `disputant` is `None` when raised by votes.
pub fn open_dispute(job: &mut Job, disputant: Option<Address>, now: Timestamp) {
    job.core.disputed = true;
    job.validation.disputed_at = now;
    job.disputant = disputant;
}

/// → Settled. Drains the escrow record; the caller disburses it.
pub fn mark_settled(job: &mut Job) {
    job.core.completed = true;
    job.escrow = Default::default();
}

/// → Expired. Drains the escrow record; the caller disburses it.
pub fn mark_expired(job: &mut Job) {
    job.core.expired = true;
    job.escrow = Default::default();
}
