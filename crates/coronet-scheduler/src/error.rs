//! Error types for the Competition Scheduler

use shared_types::{BlockHeight, ProposalId};
use thiserror::Error;

/// Competition Scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Chain source failure (tip height or block lookup)
    #[error("Chain source error: {reason}")]
    Chain { reason: String },

    /// Store failure
    #[error("Store error: {reason}")]
    Store { reason: String },

    /// Proposal disappeared between read and write
    #[error("Proposal not found: {proposal_id}")]
    ProposalNotFound { proposal_id: ProposalId },

    /// Commit Provider refused or failed order creation
    #[error("Order creation failed for proposal {proposal_id}: {reason}")]
    OrderCreation {
        proposal_id: ProposalId,
        reason: String,
    },

    /// Secondary launch trigger failed; logged by the caller, never
    /// propagated into proposal state
    #[error("Launch trigger failed: {reason}")]
    Launch { reason: String },

    /// Attempt to move the block cursor backward
    #[error("Tracker regression: cursor at {current}, refusing {requested}")]
    TrackerRegression {
        current: BlockHeight,
        requested: BlockHeight,
    },
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
