//! Role Registry: owner, moderators, agents, validators and the blacklist
//!
//! Roles are flat capability sets queried through predicates; there is no
//! hierarchy beyond "the owner may do whatever a moderator may". Every
//! mutator is owner-gated and appends to the event journal when it changes
//! something. Re-granting an existing role is a no-op.

use crate::clock::CallContext;
use crate::journal::EventJournal;
use jobledger_types::{
    Address, Admission, IdentityConfig, LedgerError, LedgerEvent, LedgerResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Which allowlist a grant or revocation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Moderator,
    Agent,
    Validator,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Moderator => "moderator",
            Role::Agent => "agent",
            Role::Validator => "validator",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    owner: Address,
    moderators: BTreeSet<Address>,
    agents: BTreeSet<Address>,
    validators: BTreeSet<Address>,
    blacklist: BTreeSet<Address>,
    identity: IdentityConfig,
    identity_locked: bool,
}

impl RoleRegistry {
    pub fn new(owner: Address, identity: IdentityConfig) -> Self {
        Self {
            owner,
            moderators: BTreeSet::new(),
            agents: BTreeSet::new(),
            validators: BTreeSet::new(),
            blacklist: BTreeSet::new(),
            identity,
            identity_locked: false,
        }
    }

    // --- Capability predicates ---

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, account: &Address) -> bool {
        *account == self.owner
    }

    /// Owner counts as a moderator.
    pub fn is_moderator(&self, account: &Address) -> bool {
        self.is_owner(account) || self.moderators.contains(account)
    }

    pub fn is_blacklisted(&self, account: &Address) -> bool {
        self.blacklist.contains(account)
    }

    /// Admitted as an agent under the current policy and not blacklisted.
    /// The zero address is never admitted.
    pub fn is_agent(&self, account: &Address) -> bool {
        !account.is_zero()
            && !self.is_blacklisted(account)
            && (self.identity.agents.is_open() || self.agents.contains(account))
    }

    /// Admitted as a validator under the current policy and not blacklisted.
    /// The zero address is never admitted.
    pub fn is_validator(&self, account: &Address) -> bool {
        !account.is_zero()
            && !self.is_blacklisted(account)
            && (self.identity.validators.is_open() || self.validators.contains(account))
    }

    pub fn identity(&self) -> &IdentityConfig {
        &self.identity
    }

    pub fn identity_locked(&self) -> bool {
        self.identity_locked
    }

    pub fn members(&self, role: Role) -> &BTreeSet<Address> {
        match role {
            Role::Moderator => &self.moderators,
            Role::Agent => &self.agents,
            Role::Validator => &self.validators,
        }
    }

    pub fn blacklisted(&self) -> &BTreeSet<Address> {
        &self.blacklist
    }

    // --- Guards ---

    pub fn require_owner(&self, caller: &Address) -> LedgerResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            warn!(caller = %caller, "Owner-only call rejected");
            Err(LedgerError::NotAuthorized(format!(
                "{} is not the owner",
                caller
            )))
        }
    }

    pub fn require_moderator(&self, caller: &Address) -> LedgerResult<()> {
        if self.is_moderator(caller) {
            Ok(())
        } else {
            warn!(caller = %caller, "Moderator-only call rejected");
            Err(LedgerError::NotAuthorized(format!(
                "{} is not a moderator",
                caller
            )))
        }
    }

    pub fn require_not_blacklisted(&self, account: &Address) -> LedgerResult<()> {
        if self.is_blacklisted(account) {
            warn!(account = %account, "Blacklisted address rejected");
            Err(LedgerError::NotAuthorized(format!(
                "{} is blacklisted",
                account
            )))
        } else {
            Ok(())
        }
    }

    pub fn require_agent(&self, account: &Address) -> LedgerResult<()> {
        self.require_not_blacklisted(account)?;
        if self.is_agent(account) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorized(format!(
                "{} is not an admitted agent",
                account
            )))
        }
    }

    pub fn require_validator(&self, account: &Address) -> LedgerResult<()> {
        self.require_not_blacklisted(account)?;
        if self.is_validator(account) {
            Ok(())
        } else {
            Err(LedgerError::NotAuthorized(format!(
                "{} is not an admitted validator",
                account
            )))
        }
    }

    // --- Owner-gated mutators ---

    /// Add `account` to a role set. Returns whether anything changed.
    pub fn grant(
        &mut self,
        ctx: &CallContext,
        role: Role,
        account: Address,
        journal: &mut EventJournal,
    ) -> LedgerResult<bool> {
        self.require_owner(&ctx.caller)?;
        require_nonzero(&account)?;

        let set = match role {
            Role::Moderator => &mut self.moderators,
            Role::Agent => &mut self.agents,
            Role::Validator => &mut self.validators,
        };
        if !set.insert(account) {
            return Ok(false);
        }

        info!(account = %account, role = role.name(), "Role granted");
        let event = match role {
            Role::Moderator => LedgerEvent::ModeratorGranted { account },
            Role::Agent => LedgerEvent::AgentGranted { account },
            Role::Validator => LedgerEvent::ValidatorGranted { account },
        };
        journal.record(ctx.now, event);
        Ok(true)
    }

    /// Remove `account` from a role set. Returns whether anything changed.
    pub fn revoke(
        &mut self,
        ctx: &CallContext,
        role: Role,
        account: Address,
        journal: &mut EventJournal,
    ) -> LedgerResult<bool> {
        self.require_owner(&ctx.caller)?;

        let set = match role {
            Role::Moderator => &mut self.moderators,
            Role::Agent => &mut self.agents,
            Role::Validator => &mut self.validators,
        };
        if !set.remove(&account) {
            return Ok(false);
        }

        info!(account = %account, role = role.name(), "Role revoked");
        let event = match role {
            Role::Moderator => LedgerEvent::ModeratorRevoked { account },
            Role::Agent => LedgerEvent::AgentRevoked { account },
            Role::Validator => LedgerEvent::ValidatorRevoked { account },
        };
        journal.record(ctx.now, event);
        Ok(true)
    }

    pub fn blacklist(
        &mut self,
        ctx: &CallContext,
        account: Address,
        journal: &mut EventJournal,
    ) -> LedgerResult<bool> {
        self.require_owner(&ctx.caller)?;
        require_nonzero(&account)?;
        if self.is_owner(&account) {
            return Err(LedgerError::InvalidParameters(
                "the owner cannot be blacklisted".into(),
            ));
        }
        if !self.blacklist.insert(account) {
            return Ok(false);
        }

        warn!(account = %account, "Address blacklisted");
        journal.record(ctx.now, LedgerEvent::Blacklisted { account });
        Ok(true)
    }

    pub fn unblacklist(
        &mut self,
        ctx: &CallContext,
        account: Address,
        journal: &mut EventJournal,
    ) -> LedgerResult<bool> {
        self.require_owner(&ctx.caller)?;
        if !self.blacklist.remove(&account) {
            return Ok(false);
        }

        info!(account = %account, "Address removed from blacklist");
        journal.record(ctx.now, LedgerEvent::Unblacklisted { account });
        Ok(true)
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
        journal: &mut EventJournal,
    ) -> LedgerResult<()> {
        self.require_owner(&ctx.caller)?;
        require_nonzero(&new_owner)?;
        if self.is_blacklisted(&new_owner) {
            return Err(LedgerError::NotAuthorized(format!(
                "{} is blacklisted",
                new_owner
            )));
        }

        let previous_owner = self.owner;
        self.owner = new_owner;

        info!(from = %previous_owner, to = %new_owner, "Ownership transferred");
        journal.record(
            ctx.now,
            LedgerEvent::OwnershipTransferred {
                previous_owner,
                new_owner,
            },
        );
        Ok(())
    }

    /// Replace the admission policy. Refused once identity is locked.
    pub fn set_identity_admission(
        &mut self,
        ctx: &CallContext,
        agents: Admission,
        validators: Admission,
        journal: &mut EventJournal,
    ) -> LedgerResult<()> {
        self.require_owner(&ctx.caller)?;
        if self.identity_locked {
            return Err(LedgerError::InvalidState(
                "identity configuration is locked".into(),
            ));
        }

        self.identity = IdentityConfig { agents, validators };

        info!(agents = ?agents, validators = ?validators, "Identity admission updated");
        journal.record(
            ctx.now,
            LedgerEvent::IdentityAdmissionUpdated {
                agents_open: agents.is_open(),
                validators_open: validators.is_open(),
            },
        );
        Ok(())
    }

    /// One-way lock. A repeat call is accepted and changes nothing.
    pub fn lock_identity_configuration(
        &mut self,
        ctx: &CallContext,
        journal: &mut EventJournal,
    ) -> LedgerResult<bool> {
        self.require_owner(&ctx.caller)?;
        if self.identity_locked {
            return Ok(false);
        }

        self.identity_locked = true;

        info!(by = %ctx.caller, "Identity configuration locked");
        journal.record(
            ctx.now,
            LedgerEvent::IdentityConfigurationLocked { by: ctx.caller },
        );
        Ok(true)
    }
}

fn require_nonzero(account: &Address) -> LedgerResult<()> {
    if account.is_zero() {
        Err(LedgerError::InvalidParameters(
            "the zero address cannot hold a role".into(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn setup() -> (RoleRegistry, EventJournal, CallContext) {
        let roles = RoleRegistry::new(addr(1), IdentityConfig::default());
        (roles, EventJournal::new(), CallContext::new(addr(1), 100))
    }

    #[test]
    fn test_owner_is_moderator() {
        let (roles, _, _) = setup();
        assert!(roles.is_owner(&addr(1)));
        assert!(roles.is_moderator(&addr(1)));
        assert!(!roles.is_moderator(&addr(2)));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let (mut roles, mut journal, ctx) = setup();
        assert!(roles
            .grant(&ctx, Role::Moderator, addr(2), &mut journal)
            .unwrap());
        assert!(!roles
            .grant(&ctx, Role::Moderator, addr(2), &mut journal)
            .unwrap());
        assert!(roles.is_moderator(&addr(2)));
        assert_eq!(journal.len(), 1);

        assert!(roles
            .revoke(&ctx, Role::Moderator, addr(2), &mut journal)
            .unwrap());
        assert!(!roles.is_moderator(&addr(2)));
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn test_non_owner_cannot_mutate() {
        let (mut roles, mut journal, _) = setup();
        let stranger = CallContext::new(addr(9), 100);
        let err = roles
            .grant(&stranger, Role::Validator, addr(9), &mut journal)
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotAuthorized(_)));
        assert!(roles.blacklist(&stranger, addr(3), &mut journal).is_err());
        assert!(journal.is_empty());
    }

    #[test]
    fn test_admission_policy() {
        let (mut roles, mut journal, ctx) = setup();
        // agents open, validators allowlisted by default
        assert!(roles.is_agent(&addr(5)));
        assert!(!roles.is_validator(&addr(5)));

        roles
            .grant(&ctx, Role::Validator, addr(5), &mut journal)
            .unwrap();
        assert!(roles.is_validator(&addr(5)));

        roles
            .set_identity_admission(&ctx, Admission::Allowlist, Admission::Open, &mut journal)
            .unwrap();
        assert!(!roles.is_agent(&addr(6)));
        assert!(roles.is_validator(&addr(6)));
    }

    #[test]
    fn test_zero_address_is_never_admitted() {
        let (mut roles, mut journal, ctx) = setup();
        roles
            .set_identity_admission(&ctx, Admission::Open, Admission::Open, &mut journal)
            .unwrap();
        assert!(!roles.is_agent(&Address::ZERO));
        assert!(!roles.is_validator(&Address::ZERO));
        assert!(matches!(
            roles.require_validator(&Address::ZERO),
            Err(LedgerError::NotAuthorized(_))
        ));
    }

    #[test]
    fn test_blacklist_overrides_admission() {
        let (mut roles, mut journal, ctx) = setup();
        roles
            .grant(&ctx, Role::Validator, addr(4), &mut journal)
            .unwrap();
        roles.blacklist(&ctx, addr(4), &mut journal).unwrap();

        assert!(!roles.is_agent(&addr(4)));
        assert!(!roles.is_validator(&addr(4)));
        assert!(matches!(
            roles.require_validator(&addr(4)),
            Err(LedgerError::NotAuthorized(_))
        ));

        roles.unblacklist(&ctx, addr(4), &mut journal).unwrap();
        assert!(roles.require_validator(&addr(4)).is_ok());
    }

    #[test]
    fn test_owner_cannot_be_blacklisted() {
        let (mut roles, mut journal, ctx) = setup();
        assert!(matches!(
            roles.blacklist(&ctx, addr(1), &mut journal),
            Err(LedgerError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_identity_lock_is_one_way_and_idempotent() {
        let (mut roles, mut journal, ctx) = setup();
        assert!(roles.lock_identity_configuration(&ctx, &mut journal).unwrap());
        assert!(!roles.lock_identity_configuration(&ctx, &mut journal).unwrap());
        assert!(roles.identity_locked());
        assert_eq!(journal.len(), 1);

        let err = roles
            .set_identity_admission(&ctx, Admission::Open, Admission::Open, &mut journal)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState(_)));
    }

    #[test]
    fn test_transfer_ownership() {
        let (mut roles, mut journal, ctx) = setup();
        roles
            .transfer_ownership(&ctx, addr(7), &mut journal)
            .unwrap();
        assert!(roles.is_owner(&addr(7)));
        assert!(roles.require_owner(&addr(1)).is_err());
        assert!(roles
            .transfer_ownership(&CallContext::new(addr(7), 1), Address::ZERO, &mut journal)
            .is_err());
    }
}
