//! Settlement & Circuit-Breaker Controller
//!
//! Platform-wide switches and the books the ledger keeps:
//!
//! - [`CircuitBreaker`]: `paused` halts every job-mutating call;
//!   `settlement_paused` halts only the ones that move value out.
//! - [`Treasury`]: what is locked in job escrows, what each address may
//!   claim, and what the platform earned. Nothing is pushed to anyone;
//!   parties pull with `claim`, the owner pulls fees with `withdrawAGI`.
//! - [`CertificateBook`]: completion certificates issued to agents.
//!
//! The treasury keeps one conservation law at all times:
//! `total_deposited == locked + Σ claimable + withdrawable + total_paid_out`.

use crate::economics::Settlement;
use jobledger_types::{
    Address, Amount, CompletionCertificate, Job, LedgerError, LedgerResult, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreaker {
    paused: bool,
    settlement_paused: bool,
}

impl CircuitBreaker {
    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn settlement_paused(&self) -> bool {
        self.settlement_paused
    }

    /// Gate for job-mutating calls.
    pub fn ensure_active(&self) -> LedgerResult<()> {
        if self.paused {
            Err(LedgerError::Paused)
        } else {
            Ok(())
        }
    }

    /// Gate for calls that release value.
    pub fn ensure_settlement_open(&self) -> LedgerResult<()> {
        self.ensure_active()?;
        if self.settlement_paused {
            Err(LedgerError::SettlementPaused)
        } else {
            Ok(())
        }
    }

    /// Returns whether the flag changed.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        std::mem::replace(&mut self.paused, paused) != paused
    }

    /// Returns whether the flag changed.
    pub fn set_settlement_paused(&mut self, paused: bool) -> bool {
        std::mem::replace(&mut self.settlement_paused, paused) != paused
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    /// Held in job escrows
    locked: Amount,
    /// Fees and slashes the owner may withdraw
    withdrawable: Amount,
    /// Proceeds each address may claim
    claimable: BTreeMap<Address, Amount>,
    /// Everything ever paid into the ledger
    total_deposited: Amount,
    /// Everything ever paid out, by claim or withdrawal
    total_paid_out: Amount,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locked(&self) -> Amount {
        self.locked
    }

    pub fn withdrawable(&self) -> Amount {
        self.withdrawable
    }

    pub fn claimable(&self, account: &Address) -> Amount {
        self.claimable.get(account).copied().unwrap_or_default()
    }

    pub fn claimable_balances(&self) -> &BTreeMap<Address, Amount> {
        &self.claimable
    }

    pub fn total_claimable(&self) -> Amount {
        self.claimable
            .values()
            .fold(Amount::ZERO, |acc, amount| acc.saturating_add(*amount))
    }

    pub fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub fn total_paid_out(&self) -> Amount {
        self.total_paid_out
    }

    /// Refuse a deposit that would overflow the books. Makes no changes.
    pub fn check_deposit(&self, amount: Amount) -> LedgerResult<()> {
        self.total_deposited
            .checked_add(amount)
            .map(|_| ())
            .ok_or_else(|| {
                LedgerError::InvalidParameters(format!(
                    "deposit of {} overflows the ledger",
                    amount
                ))
            })
    }

    /// Value paid in and locked against a job.
    pub fn deposit(&mut self, amount: Amount) -> LedgerResult<()> {
        self.check_deposit(amount)?;
        // every balance is bounded by total_deposited, so nothing below can overflow
        self.total_deposited = self.total_deposited.saturating_add(amount);
        self.locked = self.locked.saturating_add(amount);
        Ok(())
    }

    /// Move a job's escrow out of `locked` according to a plan.
    pub fn disburse(&mut self, plan: &Settlement) {
        self.locked = self.locked.saturating_sub(plan.total());
        self.withdrawable = self.withdrawable.saturating_add(plan.to_treasury);
        for (account, amount) in &plan.credits {
            let balance = self.claimable.entry(*account).or_default();
            *balance = balance.saturating_add(*amount);
        }
    }

    /// Pay out an address's whole claimable balance.
    pub fn claim(&mut self, account: &Address) -> LedgerResult<Amount> {
        let amount = self.claimable(account);
        if amount.is_zero() {
            return Err(LedgerError::InvalidState(format!(
                "{} has nothing to claim",
                account
            )));
        }
        self.claimable.remove(account);
        self.total_paid_out = self.total_paid_out.saturating_add(amount);
        Ok(amount)
    }

    /// Pay out the whole withdrawable balance.
    pub fn withdraw_all(&mut self) -> LedgerResult<Amount> {
        let amount = self.withdrawable;
        if amount.is_zero() {
            return Err(LedgerError::InvalidState(
                "treasury has nothing to withdraw".into(),
            ));
        }
        self.withdrawable = Amount::ZERO;
        self.total_paid_out = self.total_paid_out.saturating_add(amount);
        Ok(amount)
    }

    /// The conservation law holds.
    pub fn is_balanced(&self) -> bool {
        let held = self
            .locked
            .checked_add(self.total_claimable())
            .and_then(|sum| sum.checked_add(self.withdrawable))
            .and_then(|sum| sum.checked_add(self.total_paid_out));
        held == Some(self.total_deposited)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBook {
    certificates: Vec<CompletionCertificate>,
}

impl CertificateBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next sequential certificate for a settled job.
    pub fn issue(&mut self, job: &Job, now: Timestamp) -> &CompletionCertificate {
        let token_id = self.certificates.len() as u64;
        self.certificates.push(CompletionCertificate {
            token_id,
            job_id: job.id,
            agent: job.core.assigned_agent,
            completion_uri: job.completion_uri.clone(),
            issued_at: now,
        });
        &self.certificates[self.certificates.len() - 1]
    }

    pub fn get(&self, token_id: u64) -> Option<&CompletionCertificate> {
        usize::try_from(token_id)
            .ok()
            .and_then(|i| self.certificates.get(i))
    }

    pub fn held_by<'a>(
        &'a self,
        agent: &'a Address,
    ) -> impl Iterator<Item = &'a CompletionCertificate> + 'a {
        self.certificates.iter().filter(move |c| c.agent == *agent)
    }

    pub fn all(&self) -> &[CompletionCertificate] {
        &self.certificates
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_breaker_flags() {
        let mut breaker = CircuitBreaker::default();
        assert!(breaker.ensure_settlement_open().is_ok());

        assert!(breaker.set_settlement_paused(true));
        assert!(!breaker.set_settlement_paused(true));
        assert!(breaker.ensure_active().is_ok());
        assert_eq!(
            breaker.ensure_settlement_open(),
            Err(LedgerError::SettlementPaused)
        );

        assert!(breaker.set_paused(true));
        assert_eq!(breaker.ensure_active(), Err(LedgerError::Paused));
        // full pause reported first
        assert_eq!(breaker.ensure_settlement_open(), Err(LedgerError::Paused));
    }

    #[test]
    fn test_deposit_disburse_claim_withdraw() {
        let mut treasury = Treasury::new();
        treasury.deposit(Amount::new(1_000)).unwrap();
        assert_eq!(treasury.locked(), Amount::new(1_000));

        let plan = Settlement {
            credits: vec![(addr(2), Amount::new(900)), (addr(1), Amount::new(50))],
            to_treasury: Amount::new(50),
            ..Settlement::default()
        };
        treasury.disburse(&plan);
        assert!(treasury.is_balanced());
        assert_eq!(treasury.locked(), Amount::ZERO);
        assert_eq!(treasury.claimable(&addr(2)), Amount::new(900));

        assert_eq!(treasury.claim(&addr(2)).unwrap(), Amount::new(900));
        assert!(matches!(
            treasury.claim(&addr(2)),
            Err(LedgerError::InvalidState(_))
        ));
        assert_eq!(treasury.withdraw_all().unwrap(), Amount::new(50));
        assert!(treasury.withdraw_all().is_err());
        assert_eq!(treasury.total_paid_out(), Amount::new(950));
        assert!(treasury.is_balanced());
    }

    #[test]
    fn test_deposit_overflow_is_refused() {
        let mut treasury = Treasury::new();
        treasury.deposit(Amount::new(u128::MAX)).unwrap();
        let before = treasury.clone();
        assert!(matches!(
            treasury.deposit(Amount::new(1)),
            Err(LedgerError::InvalidParameters(_))
        ));
        assert_eq!(treasury, before);
    }
}
