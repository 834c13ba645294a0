//! # Typed Update Patches
//!
//! Partial updates travel through the store as per-component patch types.
//! The field set of each patch is exactly the set its component is allowed
//! to write, so ownership of every column is fixed at compile time: the
//! scheduler cannot touch artifact fields, and the monitor cannot rewrite
//! leadership bookkeeping it does not own.
//!
//! Store adapters apply a patch under their write lock, making each
//! read-modify-write atomic per record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{BlockHeight, InscriptionOrder, Proposal};
use crate::status::{OrderStatus, ProposalStatus};

// =============================================================================
// SCHEDULER -> PROPOSALS
// =============================================================================

/// Proposal fields writable by the competition scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompetitionPatch {
    /// New lifecycle status.
    pub status: Option<ProposalStatus>,
    /// First-crowning instant. Written once; the scheduler never clears it.
    pub first_time_as_leader: Option<DateTime<Utc>>,
    /// Height at which the leadership run begins.
    pub leader_start_block: Option<BlockHeight>,
    /// Survival threshold stamped at crowning.
    pub leaderboard_min_blocks: Option<u32>,
    /// Informational expiry height.
    pub expiration_block: Option<BlockHeight>,
}

impl CompetitionPatch {
    /// Status-only patch.
    pub fn status(status: ProposalStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Full crowning patch for a proposal's first leadership run.
    pub fn crown(
        now: DateTime<Utc>,
        height: BlockHeight,
        min_blocks: u32,
        expiration_block: BlockHeight,
    ) -> Self {
        Self {
            status: Some(ProposalStatus::Leader),
            first_time_as_leader: Some(now),
            leader_start_block: Some(height),
            leaderboard_min_blocks: Some(min_blocks),
            expiration_block: Some(expiration_block),
        }
    }

    /// Apply the patch in place. `None` fields are left untouched.
    pub fn apply(&self, proposal: &mut Proposal) {
        if let Some(status) = self.status {
            proposal.status = status;
        }
        if let Some(at) = self.first_time_as_leader {
            proposal.first_time_as_leader = Some(at);
        }
        if let Some(height) = self.leader_start_block {
            proposal.leader_start_block = Some(height);
        }
        if let Some(min) = self.leaderboard_min_blocks {
            proposal.leaderboard_min_blocks = min;
        }
        if let Some(height) = self.expiration_block {
            proposal.expiration_block = Some(height);
        }
    }
}

// =============================================================================
// MONITOR -> PROPOSALS
// =============================================================================

/// Proposal fields writable by the reconciliation monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcilePatch {
    /// New lifecycle status.
    pub status: Option<ProposalStatus>,
    /// Clear `first_time_as_leader`, `leader_start_block`, and
    /// `expiration_block` together, returning the row to a never-led shape.
    pub clear_leadership: bool,
}

impl ReconcilePatch {
    /// Terminal success: the artifact is confirmed on the ledger.
    pub fn inscribed() -> Self {
        Self {
            status: Some(ProposalStatus::Inscribed),
            clear_leadership: false,
        }
    }

    /// Return the proposal to open contention with no leadership history.
    pub fn reset_to_contention() -> Self {
        Self {
            status: Some(ProposalStatus::Active),
            clear_leadership: true,
        }
    }

    /// Apply the patch in place.
    pub fn apply(&self, proposal: &mut Proposal) {
        if let Some(status) = self.status {
            proposal.status = status;
        }
        if self.clear_leadership {
            proposal.first_time_as_leader = None;
            proposal.leader_start_block = None;
            proposal.expiration_block = None;
        }
    }
}

// =============================================================================
// MONITOR -> ORDERS
// =============================================================================

/// Inscription order fields writable by the reconciliation monitor.
///
/// The scheduler inserts whole rows and never patches them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    /// New lifecycle state.
    pub status: Option<OrderStatus>,
    /// Ledger artifact identifier.
    pub inscription_id: Option<String>,
    /// Public URL of the finished artifact.
    pub inscription_url: Option<String>,
    /// Commitment transaction id.
    pub txid: Option<String>,
}

impl OrderPatch {
    /// Status-only patch.
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Completion patch carrying the artifact fields.
    pub fn completed(
        inscription_id: impl Into<String>,
        inscription_url: Option<String>,
        txid: Option<String>,
    ) -> Self {
        Self {
            status: Some(OrderStatus::Completed),
            inscription_id: Some(inscription_id.into()),
            inscription_url,
            txid,
        }
    }

    /// Apply the patch in place. `None` fields are left untouched.
    pub fn apply(&self, order: &mut InscriptionOrder) {
        if let Some(status) = &self.status {
            order.status = status.clone();
        }
        if let Some(id) = &self.inscription_id {
            order.inscription_id = Some(id.clone());
        }
        if let Some(url) = &self.inscription_url {
            order.inscription_url = Some(url.clone());
        }
        if let Some(txid) = &self.txid {
            order.txid = Some(txid.clone());
        }
    }
}
