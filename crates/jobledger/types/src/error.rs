use crate::address::AddressError;
use crate::job::JobId;
use crate::uri::UriError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by every ledger operation.
///
/// Each variant is one named condition; a rejected operation reports exactly
/// one of them and leaves no state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or out-of-range input (zero payout, unsafe locator, unknown code).
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The operation is not legal in the job's or platform's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Caller lacks the required role, or is blacklisted.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("platform is paused")]
    Paused,

    #[error("settlement is paused")]
    SettlementPaused,

    /// The id was never allocated, or its slot was deleted.
    #[error("job not found: {0}")]
    JobNotFound(JobId),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidParameters(_) => ErrorKind::InvalidParameters,
            LedgerError::InvalidState(_) => ErrorKind::InvalidState,
            LedgerError::NotAuthorized(_) => ErrorKind::NotAuthorized,
            LedgerError::Paused => ErrorKind::Paused,
            LedgerError::SettlementPaused => ErrorKind::SettlementPaused,
            LedgerError::JobNotFound(_) => ErrorKind::JobNotFound,
        }
    }
}

/// Detail-free error condition, as consumers match on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidParameters,
    InvalidState,
    NotAuthorized,
    Paused,
    SettlementPaused,
    JobNotFound,
}

impl ErrorKind {
    /// The condition name consumers translate for display.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameters => "InvalidParameters",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::NotAuthorized => "NotAuthorized",
            ErrorKind::Paused => "Paused",
            ErrorKind::SettlementPaused => "SettlementPaused",
            ErrorKind::JobNotFound => "JobNotFound",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<UriError> for LedgerError {
    fn from(err: UriError) -> Self {
        LedgerError::InvalidParameters(format!("locator rejected: {}", err))
    }
}

impl From<AddressError> for LedgerError {
    fn from(err: AddressError) -> Self {
        LedgerError::InvalidParameters(err.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
