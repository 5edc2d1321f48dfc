//! Dispute Resolution Engine
//!
//! Validators vote once each on a job under review. Approvals reaching quorum
//! make the job payable; disapprovals reaching their threshold turn the
//! review into a dispute. Once disputed, votes are still counted as advice
//! for the moderator, but nothing settles on its own: every dispute ends with
//! an explicit resolution code.

use crate::economics::{self, Settlement};
use crate::lifecycle;
use jobledger_types::{
    Address, EconomicsConfig, Job, JobStatus, LedgerError, LedgerResult, QuorumConfig,
    ResolutionCode, ReviewConfig, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    Approve,
    Disapprove,
}

/// What a recorded vote did to the job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteEffect {
    /// Counted; nothing else changed
    Recorded { approvals: u32, disapprovals: u32 },
    /// Approvals reached quorum; the job is owed settlement
    QuorumReached { approvals: u32 },
    /// Disapprovals reached their threshold; the job is now disputed
    DisputeRaised { disapprovals: u32 },
}

/// Check that `validator` may vote on the job at `now`. Makes no changes.
pub fn check_vote(
    job: &Job,
    validator: &Address,
    now: Timestamp,
    review: &ReviewConfig,
) -> LedgerResult<()> {
    if *validator == job.core.employer || *validator == job.core.assigned_agent {
        return Err(LedgerError::NotAuthorized(format!(
            "{} is a party to job {} and cannot vote on it",
            validator, job.id
        )));
    }
    if job.has_voted(validator) {
        return Err(LedgerError::InvalidState(format!(
            "{} already voted on job {}",
            validator, job.id
        )));
    }

    let deadlines = lifecycle::compute_deadlines(job, review);
    let (open, deadline) = match job.status() {
        JobStatus::CompletionRequested => {
            if lifecycle::quorum_reached(job) {
                return Err(LedgerError::InvalidState(format!(
                    "job {} already reached quorum and awaits settlement",
                    job.id
                )));
            }
            (true, deadlines.expiry_time)
        }
        JobStatus::Disputed => (true, deadlines.dispute_deadline),
        _ => (false, None),
    };
    if !open {
        return Err(LedgerError::InvalidState(format!(
            "job {} is not under review ({})",
            job.id,
            job.status()
        )));
    }
    if let Some(deadline) = deadline {
        if now >= deadline {
            return Err(LedgerError::InvalidState(format!(
                "voting on job {} closed at {}",
                job.id, deadline
            )));
        }
    }
    Ok(())
}

/// Record a vote. Checks everything [`check_vote`] checks first.
pub fn cast_vote(
    job: &mut Job,
    validator: Address,
    vote: Vote,
    now: Timestamp,
    review: &ReviewConfig,
    quorum: &QuorumConfig,
) -> LedgerResult<VoteEffect> {
    check_vote(job, &validator, now, review)?;

    let under_review = job.status() == JobStatus::CompletionRequested;
    job.voters.insert(validator);
    match vote {
        Vote::Approve => job.validation.approvals = job.validation.approvals.saturating_add(1),
        Vote::Disapprove => {
            job.validation.disapprovals = job.validation.disapprovals.saturating_add(1)
        }
    }

    let approvals = job.validation.approvals;
    let disapprovals = job.validation.disapprovals;
    debug!(
        job_id = %job.id,
        validator = %validator,
        vote = ?vote,
        approvals,
        disapprovals,
        "Vote recorded"
    );

    if under_review && vote == Vote::Approve && approvals >= quorum.required_approvals {
        lifecycle::mark_quorum_reached(job, now);
        return Ok(VoteEffect::QuorumReached { approvals });
    }
    if under_review
        && vote == Vote::Disapprove
        && disapprovals >= quorum.required_disapprovals
    {
        lifecycle::open_dispute(job, None, now);
        return Ok(VoteEffect::DisputeRaised { disapprovals });
    }
    Ok(VoteEffect::Recorded {
        approvals,
        disapprovals,
    })
}

/// Settlement plan for a resolution code. The job must be disputed.
pub fn resolution_settlement(
    job: &Job,
    code: ResolutionCode,
    economics: &EconomicsConfig,
) -> LedgerResult<Settlement> {
    if job.status() != JobStatus::Disputed {
        return Err(LedgerError::InvalidState(format!(
            "job {} is not disputed ({})",
            job.id,
            job.status()
        )));
    }
    Ok(match code {
        ResolutionCode::AgentWins => economics::pay_agent(job, economics),
        ResolutionCode::EmployerWins => economics::refund_employer(job, economics),
        ResolutionCode::Split { agent_share } => {
            economics::split_payout(job, agent_share, economics)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobledger_types::{Amount, Bps, JobId, SafeUri};

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn review() -> ReviewConfig {
        ReviewConfig {
            completion_review_period: 100,
            dispute_review_period: 100,
        }
    }

    fn quorum() -> QuorumConfig {
        QuorumConfig {
            required_approvals: 2,
            required_disapprovals: 2,
        }
    }

    fn setup() -> Job {
        let mut job = Job::new(
            JobId(7),
            addr(1),
            Amount::new(10_000),
            1_000,
            SafeUri::parse("https://jobs.example/7").unwrap(),
            "",
            0,
        );
        lifecycle::assign(&mut job, addr(2), 0).unwrap();
        job.escrow.agent_stake = Amount::new(500);
        lifecycle::request_completion(
            &mut job,
            &addr(2),
            SafeUri::parse("ipfs://QmWork").unwrap(),
            10,
        )
        .unwrap();
        job
    }

    #[test]
    fn test_approvals_reach_quorum() {
        let mut job = setup();
        let first = cast_vote(&mut job, addr(10), Vote::Approve, 20, &review(), &quorum()).unwrap();
        assert_eq!(
            first,
            VoteEffect::Recorded {
                approvals: 1,
                disapprovals: 0
            }
        );
        assert_eq!(job.validation.quorum_reached_at, None);
        let second =
            cast_vote(&mut job, addr(11), Vote::Approve, 21, &review(), &quorum()).unwrap();
        assert_eq!(second, VoteEffect::QuorumReached { approvals: 2 });
        assert_eq!(job.validation.quorum_reached_at, Some(21));

        // further votes wait for settlement
        let err = cast_vote(&mut job, addr(12), Vote::Approve, 22, &review(), &quorum())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState(_)));
    }

    #[test]
    fn test_one_vote_per_address() {
        let mut job = setup();
        cast_vote(&mut job, addr(10), Vote::Approve, 20, &review(), &quorum()).unwrap();
        let err = cast_vote(&mut job, addr(10), Vote::Disapprove, 21, &review(), &quorum())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState(_)));
        assert_eq!(job.validation.disapprovals, 0);
    }

    #[test]
    fn test_parties_cannot_vote() {
        let mut job = setup();
        for party in [addr(1), addr(2)] {
            let err =
                cast_vote(&mut job, party, Vote::Approve, 20, &review(), &quorum()).unwrap_err();
            assert!(matches!(err, LedgerError::NotAuthorized(_)));
        }
    }

    #[test]
    fn test_disapprovals_raise_dispute() {
        let mut job = setup();
        cast_vote(&mut job, addr(10), Vote::Disapprove, 20, &review(), &quorum()).unwrap();
        let effect =
            cast_vote(&mut job, addr(11), Vote::Disapprove, 30, &review(), &quorum()).unwrap();
        assert_eq!(effect, VoteEffect::DisputeRaised { disapprovals: 2 });
        assert_eq!(job.status(), JobStatus::Disputed);
        assert_eq!(job.disputant, None);
        assert_eq!(job.validation.disputed_at, 30);

        // still counted while disputed, never settles on its own
        for v in 12..16 {
            let effect =
                cast_vote(&mut job, addr(v), Vote::Approve, 40, &review(), &quorum()).unwrap();
            assert!(matches!(effect, VoteEffect::Recorded { .. }));
        }
        assert_eq!(job.status(), JobStatus::Disputed);

        // dispute window closes at 30 + 100
        assert!(cast_vote(&mut job, addr(20), Vote::Approve, 130, &review(), &quorum()).is_err());
    }

    #[test]
    fn test_votes_rejected_outside_review() {
        let mut job = Job::new(
            JobId(1),
            addr(1),
            Amount::new(1),
            10,
            SafeUri::parse("https://x.example").unwrap(),
            "",
            0,
        );
        assert!(matches!(
            cast_vote(&mut job, addr(10), Vote::Approve, 1, &review(), &quorum()),
            Err(LedgerError::InvalidState(_))
        ));

        let mut job = setup();
        // review closes at 10 + 100
        assert!(cast_vote(&mut job, addr(10), Vote::Approve, 110, &review(), &quorum()).is_err());
    }

    #[test]
    fn test_resolution_requires_dispute() {
        let mut job = setup();
        let econ = EconomicsConfig::default();
        assert!(matches!(
            resolution_settlement(&job, ResolutionCode::AgentWins, &econ),
            Err(LedgerError::InvalidState(_))
        ));

        lifecycle::open_dispute(&mut job, Some(addr(1)), 20);
        job.escrow.dispute_bond = Amount::new(500);
        let plan = resolution_settlement(
            &job,
            ResolutionCode::Split {
                agent_share: Bps::new(5_000).unwrap(),
            },
            &econ,
        )
        .unwrap();
        assert_eq!(plan.total(), job.escrow.total());
        assert_eq!(plan.employer_refund, Amount::new(5_000));
    }
}
