//! Random call sequences: whatever is accepted or rejected, the books balance.

mod common;

use common::*;
use jobledger_engine::{step, Call, JobLedger, Operation};
use jobledger_types::{Amount, JobId, JobStatus, Parameter};
use proptest::prelude::*;

const ACTORS: [u8; 7] = [OWNER, EMPLOYER, AGENT, MODERATOR, 10, 11, 12];

fn job_id() -> impl Strategy<Value = JobId> {
    (0u64..4).prop_map(JobId)
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => (1u128..1_000_000, 1u64..2_000).prop_map(|(payout, duration)| Operation::CreateJob {
            payout: Amount::new(payout),
            duration,
            spec_uri: "ipfs://QmSpec".into(),
            details: String::new(),
        }),
        3 => job_id().prop_map(|job_id| Operation::ApplyForJob { job_id }),
        3 => job_id().prop_map(|job_id| Operation::RequestJobCompletion {
            job_id,
            completion_uri: "https://delivery.example/x".into(),
        }),
        3 => job_id().prop_map(|job_id| Operation::ValidateJob { job_id }),
        2 => job_id().prop_map(|job_id| Operation::DisapproveJob { job_id }),
        2 => job_id().prop_map(|job_id| Operation::DisputeJob { job_id }),
        2 => (job_id(), 0u8..5, proptest::option::of(0u16..=10_000)).prop_map(
            |(job_id, code, agent_share_bps)| Operation::ResolveDisputeWithCode {
                job_id,
                code,
                agent_share_bps,
                reason: String::new(),
            }
        ),
        1 => job_id().prop_map(|job_id| Operation::FinalizeJob { job_id }),
        2 => job_id().prop_map(|job_id| Operation::ExpireJob { job_id }),
        1 => job_id().prop_map(|job_id| Operation::CancelJob { job_id }),
        1 => job_id().prop_map(|job_id| Operation::DeleteJob { job_id }),
        1 => any::<bool>().prop_map(|paused| Operation::SetSettlementPaused { paused }),
        1 => Just(Operation::Pause),
        1 => Just(Operation::Unpause),
        2 => Just(Operation::Claim),
        1 => Just(Operation::WithdrawAgi),
        1 => (0u64..12_000).prop_map(|value| Operation::SetParameter {
            parameter: Parameter::FeeBps,
            value,
        }),
    ]
}

fn call() -> impl Strategy<Value = (usize, u64, Operation)> {
    (0..ACTORS.len(), 0u64..400, operation())
}

fn terminal_jobs_hold_nothing(ledger: &JobLedger) -> bool {
    ledger
        .jobs()
        .filter(|job| matches!(job.status(), JobStatus::Settled | JobStatus::Expired))
        .all(|job| job.escrow.is_empty())
}

fn locked_matches_escrows(ledger: &JobLedger) -> bool {
    let held = ledger
        .jobs()
        .fold(Amount::ZERO, |acc, job| acc.saturating_add(job.escrow.total()));
    held == ledger.treasury().locked()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn test_books_balance_under_any_sequence(calls in prop::collection::vec(call(), 1..60)) {
        let mut ledger = ledger();
        let mut now = 0u64;
        let mut deleted: Vec<JobId> = Vec::new();

        for (actor, gap, op) in calls {
            now += gap;
            let call = Call::new(addr(ACTORS[actor]), now, op);
            let before_next = ledger.next_job_id();

            if let Ok((next, receipt)) = step(&ledger, &call) {
                prop_assert_eq!(
                    receipt.events.len(),
                    next.journal().len() - ledger.journal().len()
                );
                if let Operation::CancelJob { job_id } | Operation::DeleteJob { job_id } = call.op {
                    deleted.push(job_id);
                }
                ledger = next;
            }

            prop_assert!(ledger.next_job_id() >= before_next);
            prop_assert!(ledger.is_balanced());
            prop_assert!(locked_matches_escrows(&ledger));
            prop_assert!(terminal_jobs_hold_nothing(&ledger));
            for id in &deleted {
                prop_assert!(ledger.job(*id).is_empty());
            }
        }
    }

    #[test]
    fn test_rejected_calls_change_nothing(calls in prop::collection::vec(call(), 1..40)) {
        let mut ledger = ledger();
        let mut now = 0u64;
        for (actor, gap, op) in calls {
            now += gap;
            let call = Call::new(addr(ACTORS[actor]), now, op);
            let snapshot = ledger.clone();
            if ledger.apply(&call).is_err() {
                prop_assert_eq!(&ledger, &snapshot);
            }
        }
    }
}
