//! # Lifecycle State Machines
//!
//! Status enums for proposals and inscription orders, with their transition
//! tables and terminal sets. Wire names are lowercase snake_case and are
//! shared by the store rows, the ingress API, and the logs.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// PROPOSAL LIFECYCLE
// =============================================================================

/// Proposal lifecycle.
///
/// ```text
///   active ---> leader ---> inscribing ---> inscribed
///     |            |            |
///     |            |            +---> active   (commit failure / monitor reset)
///     |            +---> expired               (dethroned)
///     +---> expired                            (stale, never crowned)
///     +---> rejected                           (moderation)
/// ```
///
/// `inscribed`, `expired`, and `rejected` are terminal: such rows never
/// re-enter contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// In open contention.
    Active,
    /// Currently on top of the leaderboard, serving its survival window.
    Leader,
    /// Committed; an inscription order is in flight.
    Inscribing,
    /// Artifact confirmed on the external ledger.
    Inscribed,
    /// Eliminated, either stale or dethroned.
    Expired,
    /// Refused by moderation before winning anything.
    Rejected,
}

impl ProposalStatus {
    /// Statuses that never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Inscribed | Self::Expired | Self::Rejected)
    }

    /// Statuses that keep a proposal on the leaderboard.
    pub fn is_contending(&self) -> bool {
        matches!(self, Self::Active | Self::Leader)
    }

    /// Transition table of the competition state machine.
    pub fn can_transition_to(&self, next: ProposalStatus) -> bool {
        use ProposalStatus::{Active, Expired, Inscribed, Inscribing, Leader, Rejected};
        matches!(
            (self, next),
            (Active, Leader)
                | (Active, Expired)
                | (Active, Rejected)
                | (Leader, Inscribing)
                | (Leader, Expired)
                | (Inscribing, Inscribed)
                | (Inscribing, Active)
        )
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Leader => "leader",
            Self::Inscribing => "inscribing",
            Self::Inscribed => "inscribed",
            Self::Expired => "expired",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ORDER LIFECYCLE
// =============================================================================

/// Inscription order lifecycle.
///
/// Mirrors the last provider-reported state, plus the internal terminal
/// markers the monitor writes. Raw provider strings are preserved on the
/// non-enumerable variants so the row always shows what the provider last
/// said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting payment and processing.
    Pending,
    /// Open order; carries the latest raw provider status string.
    InProgress(String),
    /// Artifact confirmed. Terminal success; never polled again.
    Completed,
    /// Provider-reported terminal failure; carries the raw status string.
    Failed(String),
    /// Force-closed after the stuck-order window elapsed with no artifact.
    StuckTimeoutAutoReset,
}

impl OrderStatus {
    /// Statuses the monitor never touches again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed(_) | Self::StuckTimeoutAutoReset
        )
    }

    /// Terminal statuses that put the owning proposal back in contention.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::StuckTimeoutAutoReset)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::InProgress(raw) => write!(f, "in_progress:{raw}"),
            Self::Completed => f.write_str("completed"),
            Self::Failed(raw) => write!(f, "failed:{raw}"),
            Self::StuckTimeoutAutoReset => f.write_str("stuck_timeout_auto_reset"),
        }
    }
}
