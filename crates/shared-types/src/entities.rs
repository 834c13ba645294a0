//! # Core Domain Entities
//!
//! Defines the records the competition runs on. Everything here is plain
//! data: lifecycle rules live in [`crate::status`], partial updates in
//! [`crate::patch`].
//!
//! ## Clusters
//!
//! - **Proposals**: `Proposal`, the competition entry
//! - **Orders**: `InscriptionOrder`, one commit attempt per surviving leader
//! - **Cursor**: `BlockTracker`, the single resume position

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{OrderStatus, ProposalStatus};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Store-assigned proposal identifier.
pub type ProposalId = u64;

/// Store-assigned inscription order row identifier.
///
/// Distinct from the provider-issued `order_id` string carried on the row.
pub type OrderRowId = u64;

/// Height on the external chain.
pub type BlockHeight = u64;

// =============================================================================
// CLUSTER A: PROPOSALS
// =============================================================================

/// A competition entry.
///
/// Submitted through the ingress API, ranked by votes, crowned and retired by
/// the scheduler, and finally inscribed or returned to contention by the
/// reconciliation monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Store-assigned identifier.
    pub id: ProposalId,
    /// Display name of the proposed asset.
    pub name: String,
    /// Short uppercase ticker.
    pub ticker: String,
    /// Free-form description, inscribed alongside name and ticker.
    pub description: String,
    /// Current vote total.
    pub total_votes: u64,
    /// Lifecycle status.
    pub status: ProposalStatus,
    /// Instant of the first crowning. Written once by the scheduler; cleared
    /// only when the monitor resets the proposal to open contention.
    pub first_time_as_leader: Option<DateTime<Utc>>,
    /// Height at which the current leadership run began.
    pub leader_start_block: Option<BlockHeight>,
    /// Survival threshold in blocks, fixed at leadership start.
    pub leaderboard_min_blocks: u32,
    /// Height observed when the proposal was submitted.
    pub creation_block: BlockHeight,
    /// Informational expiry height, stamped at crowning.
    pub expiration_block: Option<BlockHeight>,
    /// Submission instant.
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    /// Schema default for `leaderboard_min_blocks` on rows that have never
    /// led. The scheduler stamps its own configured threshold at crowning,
    /// and that stamped value is the one survival checks read.
    pub const DEFAULT_MIN_BLOCKS: u32 = 1;

    /// A fresh submission in open contention.
    pub fn new(
        id: ProposalId,
        name: impl Into<String>,
        ticker: impl Into<String>,
        description: impl Into<String>,
        creation_block: BlockHeight,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            ticker: ticker.into(),
            description: description.into(),
            total_votes: 0,
            status: ProposalStatus::Active,
            first_time_as_leader: None,
            leader_start_block: None,
            leaderboard_min_blocks: Self::DEFAULT_MIN_BLOCKS,
            creation_block,
            expiration_block: None,
            created_at: Utc::now(),
        }
    }

    /// True once the proposal has been crowned at least once.
    pub fn has_led(&self) -> bool {
        self.first_time_as_leader.is_some()
    }

    /// Inclusive count of blocks led as of `height`, or `None` when no
    /// leadership run is recorded. A leader crowned at height `h` has led
    /// one block at `h` and two at `h + 1`.
    pub fn blocks_as_leader(&self, height: BlockHeight) -> Option<u64> {
        self.leader_start_block
            .map(|start| height.saturating_sub(start) + 1)
    }
}

// =============================================================================
// CLUSTER B: INSCRIPTION ORDERS
// =============================================================================

/// One commit attempt against the external ledger.
///
/// Created by the scheduler when a surviving leader commits; every later
/// mutation belongs to the reconciliation monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InscriptionOrder {
    /// Store-assigned row identifier.
    pub id: OrderRowId,
    /// Owning proposal.
    pub proposal_id: ProposalId,
    /// Height of the commit decision.
    pub block_height: BlockHeight,
    /// Hash of the block at `block_height`.
    pub block_hash: String,
    /// Provider-issued order identifier.
    pub order_id: String,
    /// Last known lifecycle state.
    pub status: OrderStatus,
    /// Payment target returned by the provider at creation.
    pub payment_address: String,
    /// Amount due in satoshis, as quoted by the provider.
    pub payment_amount: u64,
    /// Ledger artifact identifier, present once the order completes.
    pub inscription_id: Option<String>,
    /// Public URL of the finished artifact.
    pub inscription_url: Option<String>,
    /// Commitment transaction id on the external ledger.
    pub txid: Option<String>,
    /// Row creation instant; basis of the stuck-order window.
    pub created_at: DateTime<Utc>,
}

impl InscriptionOrder {
    /// Age of the order row as of `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

// =============================================================================
// CLUSTER C: BLOCK CURSOR
// =============================================================================

/// Singleton cursor over the external chain.
///
/// Monotonically non-decreasing. This record is the sole resume position
/// across restarts: a height is recorded only after its processing completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTracker {
    /// Height of the last fully processed block.
    pub last_processed_block: BlockHeight,
    /// Hash of that block.
    pub last_processed_hash: String,
    /// Instant of the last tick that touched the tracker.
    pub last_checked: DateTime<Utc>,
}

impl BlockTracker {
    /// Cursor positioned at `height`.
    pub fn at(height: BlockHeight, hash: impl Into<String>) -> Self {
        Self {
            last_processed_block: height,
            last_processed_hash: hash.into(),
            last_checked: Utc::now(),
        }
    }
}
