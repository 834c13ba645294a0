//! # Ingress Port
//!
//! The surface the HTTP API drives. Both store backends implement
//! [`ProposalDirectory`] directly, so the ingress handlers stay oblivious to
//! which backend the process was started with.

use async_trait::async_trait;
use serde::Serialize;
use shared_types::{BlockHeight, Proposal, ProposalId, ProposalStatus};
use thiserror::Error;

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors surfaced to the ingress API.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No proposal with that id.
    #[error("Proposal {proposal_id} not found")]
    NotFound {
        /// Requested id.
        proposal_id: ProposalId,
    },

    /// The proposal exists but its status forbids the operation.
    #[error("Proposal {proposal_id} is {status}")]
    Conflict {
        /// Target id.
        proposal_id: ProposalId,
        /// Status that blocked the operation.
        status: ProposalStatus,
    },

    /// Backend failure.
    #[error("Store failure: {reason}")]
    Store {
        /// Backend error description.
        reason: String,
    },
}

/// A validated submission, ready to be assigned an id and a creation block.
#[derive(Debug, Clone)]
pub struct ProposalDraft {
    /// Display name, 1..=64 chars.
    pub name: String,
    /// Uppercase ticker, 1..=16 chars.
    pub ticker: String,
    /// Free-form description, up to 512 chars.
    pub description: String,
}

/// Per-status row counts for the status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Rows in open contention.
    pub active: u64,
    /// Rows serving a survival window.
    pub leader: u64,
    /// Rows with an order in flight.
    pub inscribing: u64,
    /// Rows confirmed on the external ledger.
    pub inscribed: u64,
    /// Eliminated rows.
    pub expired: u64,
    /// Moderated rows.
    pub rejected: u64,
}

impl StatusCounts {
    /// Bump the bucket for `status`.
    pub fn record(&mut self, status: ProposalStatus) {
        match status {
            ProposalStatus::Active => self.active += 1,
            ProposalStatus::Leader => self.leader += 1,
            ProposalStatus::Inscribing => self.inscribing += 1,
            ProposalStatus::Inscribed => self.inscribed += 1,
            ProposalStatus::Expired => self.expired += 1,
            ProposalStatus::Rejected => self.rejected += 1,
        }
    }
}

/// Operator-facing snapshot of the whole system.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    /// Cursor height, `None` before the first tick.
    pub last_processed_block: Option<BlockHeight>,
    /// Cursor hash, `None` before the first tick.
    pub last_processed_hash: Option<String>,
    /// Proposal counts per status.
    pub proposals: StatusCounts,
}

/// Read/write surface of the proposal directory.
///
/// Submissions are stamped with the current cursor height as their
/// `creation_block`; a submission that arrives before the first tick is
/// stamped with height zero and ages out against real heights like any other
/// row.
#[async_trait]
pub trait ProposalDirectory: Send + Sync {
    /// Insert a fresh proposal in open contention and return it.
    async fn submit_proposal(&self, draft: ProposalDraft) -> DirectoryResult<Proposal>;

    /// Add one vote. Fails with [`DirectoryError::Conflict`] once the
    /// proposal has left contention.
    async fn cast_vote(&self, id: ProposalId) -> DirectoryResult<Proposal>;

    /// All proposals, votes descending, ties broken by ascending id.
    async fn list_proposals(&self) -> DirectoryResult<Vec<Proposal>>;

    /// Fetch one proposal.
    async fn proposal(&self, id: ProposalId) -> DirectoryResult<Proposal>;

    /// Moderate an active proposal out of the competition.
    async fn reject_proposal(&self, id: ProposalId) -> DirectoryResult<Proposal>;

    /// Cursor position plus per-status counts.
    async fn status_summary(&self) -> DirectoryResult<StatusSummary>;
}
