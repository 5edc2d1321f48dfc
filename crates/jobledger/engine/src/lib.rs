//! # jobledger-engine
//!
//! The state machine behind the job ledger: escrowed payouts, agent stakes,
//! validator votes, disputes and their resolution, expiry, and the pull-based
//! payment books.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────────────────────┐
//!   Call ─step──▶  │           JobLedger          │ ──▶ Receipt
//!                  │  ┌────────────┐ ┌──────────┐ │
//!                  │  │RoleRegistry│ │JobRegistry│ │
//!                  │  └────────────┘ └──────────┘ │
//!                  │  ┌──────────────┐ ┌────────┐ │
//!                  │  │CircuitBreaker│ │Treasury│ │
//!                  │  └──────────────┘ └────────┘ │
//!                  │        EventJournal          │
//!                  └──────────────────────────────┘
//! ```
//!
//! Lifecycle rules live in [`lifecycle`] and [`disputes`] as functions over a
//! single [`Job`](jobledger_types::Job); value splits live in [`economics`] as
//! pure settlement plans. [`JobLedger`] composes them and is the only place
//! that moves value.
//!
//! Every call is all-or-nothing: [`step`] works on a copy and hands it back
//! only on success.

#![deny(unsafe_code)]

pub mod clock;
pub mod controller;
pub mod disputes;
pub mod economics;
pub mod journal;
pub mod ledger;
pub mod lifecycle;
pub mod operation;
pub mod registry;
pub mod roles;

pub use clock::{CallContext, Clock, FixedClock, SystemClock};
pub use controller::{CertificateBook, CircuitBreaker, Treasury};
pub use disputes::{Vote, VoteEffect};
pub use economics::Settlement;
pub use journal::EventJournal;
pub use ledger::{JobLedger, Payment};
pub use lifecycle::{Deadlines, ExpiryKind};
pub use operation::{step, Call, Operation, Outcome, Receipt};
pub use registry::{JobRegistry, JobSlot};
pub use roles::{Role, RoleRegistry};
