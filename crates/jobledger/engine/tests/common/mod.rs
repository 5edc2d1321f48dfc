#![allow(dead_code)]

use jobledger_engine::{CallContext, JobLedger};
use jobledger_types::{Address, Amount, JobId, LedgerConfig};

pub const OWNER: u8 = 1;
pub const EMPLOYER: u8 = 2;
pub const AGENT: u8 = 3;
pub const MODERATOR: u8 = 5;
pub const VALIDATORS: [u8; 3] = [10, 11, 12];

pub const PAYOUT: u128 = 10_000;
pub const DURATION: u64 = 1_000;

pub fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

pub fn ctx(who: u8, now: u64) -> CallContext {
    CallContext::new(addr(who), now)
}

/// Ledger with default economics, quorum 2/2, one moderator, three validators.
pub fn ledger() -> JobLedger {
    let mut config = LedgerConfig::new(addr(OWNER));
    config.quorum.required_approvals = 2;
    config.quorum.required_disapprovals = 2;
    let mut ledger = JobLedger::new(config).unwrap();
    let owner = ctx(OWNER, 0);
    ledger.grant_moderator(&owner, addr(MODERATOR)).unwrap();
    for v in VALIDATORS {
        ledger.grant_validator(&owner, addr(v)).unwrap();
    }
    ledger
}

/// Job created at t=0, taken by AGENT at t=10.
pub fn assigned_job(ledger: &mut JobLedger) -> JobId {
    let id = ledger
        .create_job(
            &ctx(EMPLOYER, 0),
            Amount::new(PAYOUT),
            DURATION,
            "ipfs://QmSpec",
            "",
        )
        .unwrap();
    ledger.apply_for_job(&ctx(AGENT, 10), id).unwrap();
    id
}

/// Job with completion requested at t=20.
pub fn job_under_review(ledger: &mut JobLedger) -> JobId {
    let id = assigned_job(ledger);
    ledger
        .request_job_completion(&ctx(AGENT, 20), id, "ipfs://QmDelivery")
        .unwrap();
    id
}
