//! Error types for the Order Reconciliation Monitor

use shared_types::ProposalId;
use thiserror::Error;

/// Order Reconciliation Monitor errors
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// Provider rate limit hit (HTTP 429)
    #[error("Provider rate limited")]
    RateLimited,

    /// Provider server-side failure (HTTP 5xx)
    #[error("Provider unavailable: {reason}")]
    ProviderUnavailable { reason: String },

    /// Network-level failure reaching the provider
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    /// Provider returned a body the monitor cannot use
    #[error("Bad provider response: {reason}")]
    BadResponse { reason: String },

    /// Store failure
    #[error("Store error: {reason}")]
    Store { reason: String },

    /// Proposal disappeared between read and write
    #[error("Proposal not found: {proposal_id}")]
    ProposalNotFound { proposal_id: ProposalId },
}

impl ReconcilerError {
    /// Whether a retry with backoff can help.
    ///
    /// Rate limits, 5xx responses, and transport failures are worth
    /// retrying; malformed bodies and store failures are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ProviderUnavailable { .. } | Self::Transport { .. }
        )
    }
}

/// Result type for monitor operations
pub type ReconcilerResult<T> = Result<T, ReconcilerError>;
