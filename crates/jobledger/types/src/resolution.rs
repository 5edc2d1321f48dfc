//! Dispute resolution codes
//!
//! A moderator closes a dispute by picking one code. Codes arrive as a raw
//! byte (plus a share for `Split`) and anything unrecognised is refused
//! before state is touched.

use crate::{Bps, LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};

/// Deterministic outcome selected by a moderator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionCode {
    /// Agent is paid as if the completion had been approved.
    AgentWins,
    /// Employer is refunded and the agent's stake is slashed.
    EmployerWins,
    /// Payout divided: `agent_share` to the agent, the rest back to the employer.
    Split { agent_share: Bps },
}

impl ResolutionCode {
    pub const AGENT_WINS: u8 = 1;
    pub const EMPLOYER_WINS: u8 = 2;
    pub const SPLIT: u8 = 3;

    /// Decode the wire form. `agent_share_bps` is required for `Split` only.
    pub fn from_raw(code: u8, agent_share_bps: Option<u16>) -> LedgerResult<Self> {
        match code {
            Self::AGENT_WINS => Ok(ResolutionCode::AgentWins),
            Self::EMPLOYER_WINS => Ok(ResolutionCode::EmployerWins),
            Self::SPLIT => {
                let share = agent_share_bps.ok_or_else(|| {
                    LedgerError::InvalidParameters("split resolution needs an agent share".into())
                })?;
                Ok(ResolutionCode::Split {
                    agent_share: Bps::new(share)?,
                })
            }
            other => Err(LedgerError::InvalidParameters(format!(
                "unrecognized resolution code {}",
                other
            ))),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ResolutionCode::AgentWins => Self::AGENT_WINS,
            ResolutionCode::EmployerWins => Self::EMPLOYER_WINS,
            ResolutionCode::Split { .. } => Self::SPLIT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResolutionCode::AgentWins => "AgentWins",
            ResolutionCode::EmployerWins => "EmployerWins",
            ResolutionCode::Split { .. } => "Split",
        }
    }
}
