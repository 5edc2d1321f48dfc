//! # jobledger-types
//!
//! Domain types for the job ledger: the records a marketplace keeps for a
//! unit of paid work from creation to settlement.
//!
//! This crate is data only. It knows how to parse and validate values at the
//! boundary (addresses, basis points, resource locators, resolution codes)
//! and how to derive a job's visible status from its stored flags, but it
//! never moves value or enforces transitions. That is `jobledger-engine`.
//!
//! ## Boundary rules
//!
//! - Addresses compare as bytes. Textual case never matters.
//! - Resource locators are checked against an allowed scheme set before they
//!   can be stored, so a `SafeUri` is always safe to expose for navigation.
//! - Every failure surfaces as exactly one named [`LedgerError`] condition.

#![deny(unsafe_code)]

pub mod address;
pub mod amount;
pub mod config;
pub mod error;
pub mod event;
pub mod job;
pub mod resolution;
pub mod uri;

pub use address::{Address, AddressError};
pub use amount::{Amount, Bps, BPS_DENOMINATOR};
pub use config::{
    Admission, EconomicsConfig, IdentityConfig, LedgerConfig, Parameter, QuorumConfig,
    ReviewConfig,
};
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use event::{JournalEntry, LedgerEvent};
pub use job::{
    CompletionCertificate, Job, JobCore, JobEscrow, JobId, JobStatus, JobValidation, Timestamp,
};
pub use resolution::ResolutionCode;
pub use uri::{SafeUri, UriError, UriScheme};

/// Longest accepted resource locator, in bytes.
pub const MAX_URI_LEN: usize = 2048;

/// Longest accepted job note.
pub const MAX_NOTE_LEN: usize = 4096;

/// Longest accepted dispute resolution reason.
pub const MAX_REASON_LEN: usize = 1024;
