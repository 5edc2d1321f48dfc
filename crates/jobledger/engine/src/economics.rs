//! Bond & Economics Calculator
//!
//! Pure functions over basis points, plus the settlement plans that decide
//! where a job's escrow goes when it leaves the ledger's custody. A plan
//! always disburses exactly the job's escrow: what the parties receive plus
//! what the treasury keeps equals what was locked.

use jobledger_types::{Address, Amount, Bps, EconomicsConfig, Job, BPS_DENOMINATOR};
use serde::{Deserialize, Serialize};

/// `floor(amount * bps / 10_000)`, exact for every `u128` amount.
pub fn apply_bps(amount: Amount, bps: Bps) -> Amount {
    let denominator = BPS_DENOMINATOR as u128;
    let bps = bps.get() as u128;
    let whole = amount.0 / denominator;
    let rest = amount.0 % denominator;
    // whole * bps <= amount since bps <= denominator; rest * bps < 10^8
    Amount(whole * bps + rest * bps / denominator)
}

/// Value a party locks against a payout.
pub fn bond(payout: Amount, bond_bps: Bps) -> Amount {
    apply_bps(payout, bond_bps)
}

/// Portion of a stake forfeited to the treasury.
pub fn slash(amount: Amount, slash_bps: Bps) -> Amount {
    apply_bps(amount, slash_bps)
}

/// Platform fee taken from an agent's proceeds.
pub fn fee(amount: Amount, fee_bps: Bps) -> Amount {
    apply_bps(amount, fee_bps)
}

/// Divide a payout: `(agent_share, employer_share)`, summing to `payout`.
pub fn split(payout: Amount, agent_bps: Bps) -> (Amount, Amount) {
    let agent = apply_bps(payout, agent_bps);
    (agent, payout.saturating_sub(agent))
}

/// Who receives what when a job's escrow is released.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Credits to claimable balances, in the order they were planned
    pub credits: Vec<(Address, Amount)>,
    /// Fees and slashes kept by the platform
    pub to_treasury: Amount,
    /// Agent's share of the payout, after fee
    pub agent_payout: Amount,
    /// Payout returned to the employer
    pub employer_refund: Amount,
    pub fee: Amount,
    pub slashed: Amount,
}

impl Settlement {
    fn credit(&mut self, to: Address, amount: Amount) {
        if !amount.is_zero() {
            self.credits.push((to, amount));
        }
    }

    /// Everything this plan moves out of escrow.
    pub fn total(&self) -> Amount {
        self.credits
            .iter()
            .fold(self.to_treasury, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// Credits owed to one address.
    pub fn credited_to(&self, account: &Address) -> Amount {
        self.credits
            .iter()
            .filter(|(to, _)| to == account)
            .fold(Amount::ZERO, |acc, (_, amount)| acc.saturating_add(*amount))
    }
}

fn return_dispute_bond(plan: &mut Settlement, job: &Job) {
    if let Some(disputant) = job.disputant {
        plan.credit(disputant, job.escrow.dispute_bond);
    }
}

/// Agent is paid: payout minus fee, stake returned.
pub fn pay_agent(job: &Job, economics: &EconomicsConfig) -> Settlement {
    let payout = job.escrow.payout;
    let fee = fee(payout, economics.fee_bps);
    let agent_payout = payout.saturating_sub(fee);

    let mut plan = Settlement {
        to_treasury: fee,
        agent_payout,
        fee,
        ..Settlement::default()
    };
    plan.credit(
        job.core.assigned_agent,
        agent_payout.saturating_add(job.escrow.agent_stake),
    );
    return_dispute_bond(&mut plan, job);
    plan
}

/// Employer is refunded; the agent's stake is slashed.
pub fn refund_employer(job: &Job, economics: &EconomicsConfig) -> Settlement {
    let stake = job.escrow.agent_stake;
    let slashed = slash(stake, economics.slash_bps);

    let mut plan = Settlement {
        to_treasury: slashed,
        employer_refund: job.escrow.payout,
        slashed,
        ..Settlement::default()
    };
    plan.credit(job.core.employer, job.escrow.payout);
    plan.credit(job.core.assigned_agent, stake.saturating_sub(slashed));
    return_dispute_bond(&mut plan, job);
    plan
}

/// Payout divided by `agent_bps`; fee taken from the agent's side only.
pub fn split_payout(job: &Job, agent_bps: Bps, economics: &EconomicsConfig) -> Settlement {
    let (agent_gross, employer_share) = split(job.escrow.payout, agent_bps);
    let fee = fee(agent_gross, economics.fee_bps);
    let agent_payout = agent_gross.saturating_sub(fee);

    let mut plan = Settlement {
        to_treasury: fee,
        agent_payout,
        employer_refund: employer_share,
        fee,
        ..Settlement::default()
    };
    plan.credit(
        job.core.assigned_agent,
        agent_payout.saturating_add(job.escrow.agent_stake),
    );
    plan.credit(job.core.employer, employer_share);
    return_dispute_bond(&mut plan, job);
    plan
}

/// Employer refunded and the stake returned in full, no fee or slash.
pub fn refund_without_penalty(job: &Job) -> Settlement {
    let mut plan = Settlement {
        employer_refund: job.escrow.payout,
        ..Settlement::default()
    };
    plan.credit(job.core.employer, job.escrow.payout);
    if job.is_assigned() {
        plan.credit(job.core.assigned_agent, job.escrow.agent_stake);
    }
    return_dispute_bond(&mut plan, job);
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobledger_types::{JobId, SafeUri};
    use proptest::prelude::*;

    fn bps(v: u16) -> Bps {
        Bps::new(v).unwrap()
    }

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn assigned_job(payout: u128, stake: u128) -> Job {
        let mut job = Job::new(
            JobId(1),
            addr(1),
            Amount::new(payout),
            60,
            SafeUri::parse("https://jobs.example/1").unwrap(),
            "",
            0,
        );
        job.core.assigned_agent = addr(2);
        job.escrow.agent_stake = Amount::new(stake);
        job
    }

    fn economics(bond: u16, slash: u16, fee: u16) -> EconomicsConfig {
        EconomicsConfig {
            bond_bps: bps(bond),
            slash_bps: bps(slash),
            fee_bps: bps(fee),
        }
    }

    #[test]
    fn bond_reference_values() {
        assert_eq!(bond(Amount::new(10_000), bps(500)), Amount::new(500));
        assert_eq!(bond(Amount::new(10_000), Bps::ZERO), Amount::ZERO);
        assert_eq!(bond(Amount::ZERO, bps(500)), Amount::ZERO);
        // truncates toward zero
        assert_eq!(bond(Amount::new(199), bps(50)), Amount::ZERO);
        assert_eq!(bond(Amount::new(10_001), bps(9_999)), Amount::new(9_999));
    }

    #[test]
    fn apply_bps_does_not_overflow() {
        let max = Amount::new(u128::MAX);
        assert_eq!(apply_bps(max, Bps::MAX), max);
        assert_eq!(apply_bps(max, bps(5_000)), Amount::new(u128::MAX / 2));
    }

    #[test]
    fn split_sums_to_payout() {
        let (agent, employer) = split(Amount::new(1_001), bps(3_333));
        assert_eq!(agent, Amount::new(333));
        assert_eq!(employer, Amount::new(668));
    }

    #[test]
    fn pay_agent_returns_stake_and_bond() {
        let mut job = assigned_job(10_000, 500);
        job.disputant = Some(addr(3));
        job.escrow.dispute_bond = Amount::new(500);

        let plan = pay_agent(&job, &economics(500, 1_000, 100));
        assert_eq!(plan.fee, Amount::new(100));
        assert_eq!(plan.agent_payout, Amount::new(9_900));
        assert_eq!(plan.credited_to(&addr(2)), Amount::new(10_400));
        assert_eq!(plan.credited_to(&addr(3)), Amount::new(500));
        assert_eq!(plan.total(), job.escrow.total());
    }

    #[test]
    fn refund_employer_slashes_stake() {
        let job = assigned_job(10_000, 500);
        let plan = refund_employer(&job, &economics(500, 1_000, 100));
        assert_eq!(plan.employer_refund, Amount::new(10_000));
        assert_eq!(plan.slashed, Amount::new(50));
        assert_eq!(plan.to_treasury, Amount::new(50));
        assert_eq!(plan.credited_to(&addr(2)), Amount::new(450));
        assert_eq!(plan.total(), job.escrow.total());
    }

    #[test]
    fn employer_disputant_gets_bond_alongside_refund() {
        let mut job = assigned_job(10_000, 500);
        job.disputant = Some(addr(1));
        job.escrow.dispute_bond = Amount::new(500);

        let plan = refund_employer(&job, &economics(500, 10_000, 0));
        assert_eq!(plan.credited_to(&addr(1)), Amount::new(10_500));
        assert_eq!(plan.credited_to(&addr(2)), Amount::ZERO);
        assert_eq!(plan.total(), job.escrow.total());
    }

    #[test]
    fn refund_without_penalty_on_open_job() {
        let job = Job::new(
            JobId(0),
            addr(1),
            Amount::new(42),
            1,
            SafeUri::parse("ipfs://x").unwrap(),
            "",
            0,
        );
        let plan = refund_without_penalty(&job);
        assert_eq!(plan.credits, vec![(addr(1), Amount::new(42))]);
        assert_eq!(plan.to_treasury, Amount::ZERO);
    }

    proptest! {
        #[test]
        fn bond_is_monotonic(
            a in 0u128..u128::MAX / 2,
            b in 0u128..1_000_000,
            p in 0u16..=10_000,
            q in 0u16..=10_000,
        ) {
            let (lo_p, hi_p) = (p.min(q), p.max(q));
            let payout = Amount::new(a);
            let larger = Amount::new(a + b);
            prop_assert!(bond(payout, bps(lo_p)) <= bond(payout, bps(hi_p)));
            prop_assert!(bond(payout, bps(p)) <= bond(larger, bps(p)));
            prop_assert!(bond(payout, bps(p)) <= payout);
        }

        #[test]
        fn every_plan_disburses_exactly_the_escrow(
            payout in 1u128..1_000_000_000_000,
            bond_bps in 0u16..=10_000,
            slash_bps in 0u16..=10_000,
            fee_bps in 0u16..=10_000,
            share in 0u16..=10_000,
            disputed in any::<bool>(),
        ) {
            let econ = economics(bond_bps, slash_bps, fee_bps);
            let stake = bond(Amount::new(payout), econ.bond_bps);
            let mut job = assigned_job(payout, stake.0);
            if disputed {
                job.disputant = Some(addr(4));
                job.escrow.dispute_bond = stake;
            }
            let locked = job.escrow.total();

            prop_assert_eq!(pay_agent(&job, &econ).total(), locked);
            prop_assert_eq!(refund_employer(&job, &econ).total(), locked);
            prop_assert_eq!(split_payout(&job, bps(share), &econ).total(), locked);
            prop_assert_eq!(refund_without_penalty(&job).total(), locked);
        }
    }
}
