//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Everything the scheduler needs from the outside world, as traits the
//! runtime satisfies with concrete adapters. The store port accepts only
//! [`CompetitionPatch`](shared_types::CompetitionPatch), so the scheduler is
//! incapable of writing fields owned by the reconciliation monitor.

use crate::error::SchedulerResult;
use async_trait::async_trait;
use serde::Serialize;
use shared_types::{
    BlockHeight, BlockTracker, CompetitionPatch, InscriptionOrder, OrderRowId, Proposal,
    ProposalId, ProposalStatus,
};
use uuid::Uuid;

/// Correlation ID for tracking request/response pairs
pub type CorrelationId = Uuid;

/// Read access to the external chain
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Current tip height.
    async fn current_height(&self) -> SchedulerResult<BlockHeight>;

    /// Metadata of the block at `height`.
    async fn block_at(&self, height: BlockHeight) -> SchedulerResult<BlockInfo>;
}

/// Block metadata needed for provenance stamping
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Height of this block.
    pub height: BlockHeight,
    /// Block hash, hex-encoded.
    pub hash: String,
    /// Unix timestamp the chain reports for the block.
    pub timestamp: u64,
}

/// Store operations the scheduler is allowed to perform
///
/// The scheduler creates order rows, owns every proposal transition into
/// `leader`, `expired`, and `inscribing` (plus the rollback to `active` on
/// creation failure), and owns the block tracker. Every other mutation
/// belongs to the reconciliation monitor and is absent here.
#[async_trait]
pub trait CompetitionStore: Send + Sync {
    /// Proposals whose status is in `statuses`, votes descending then id
    /// ascending.
    async fn proposals_with_status(
        &self,
        statuses: &[ProposalStatus],
    ) -> SchedulerResult<Vec<Proposal>>;

    /// Apply a scheduler patch to one proposal.
    async fn update_proposal(&self, id: ProposalId, patch: CompetitionPatch)
        -> SchedulerResult<()>;

    /// The most recent non-terminal order owned by `proposal_id`, if any.
    async fn open_order_for(
        &self,
        proposal_id: ProposalId,
    ) -> SchedulerResult<Option<InscriptionOrder>>;

    /// Insert a freshly created order row, returning its row id. The store
    /// stamps `status = pending` and `created_at`.
    async fn insert_order(&self, order: NewOrder) -> SchedulerResult<OrderRowId>;

    /// Current cursor, `None` until the first tick pins it.
    async fn block_tracker(&self) -> SchedulerResult<Option<BlockTracker>>;

    /// Move the cursor to `height`. Refuses to move backward.
    async fn advance_tracker(&self, height: BlockHeight, hash: &str) -> SchedulerResult<()>;
}

/// Row to insert after the Commit Provider accepted an order
#[derive(Clone, Debug)]
pub struct NewOrder {
    /// Owning proposal.
    pub proposal_id: ProposalId,
    /// Height of the commit decision.
    pub block_height: BlockHeight,
    /// Hash of the block at `block_height`.
    pub block_hash: String,
    /// Provider-issued order identifier.
    pub order_id: String,
    /// Payment target returned at creation.
    pub payment_address: String,
    /// Amount due in satoshis.
    pub payment_amount: u64,
}

/// Commit Provider order desk (creation side)
///
/// The polling side lives in the reconciliation monitor; one physical
/// provider adapter implements both traits so each subsystem sees only the
/// calls it owns.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create an inscription order for a surviving leader.
    async fn create_order(&self, request: CreateOrderRequest) -> SchedulerResult<OrderReceipt>;
}

/// Payload inscribed for a winning proposal
#[derive(Clone, Debug, Serialize)]
pub struct CreateOrderRequest {
    /// Correlation id, logged on both ends.
    pub correlation_id: CorrelationId,
    /// Display name of the asset.
    pub name: String,
    /// Ticker of the asset.
    pub ticker: String,
    /// Free-form description.
    pub description: String,
    /// Vote count at commit time.
    pub total_votes: u64,
    /// Provenance: winning proposal.
    pub proposal_id: ProposalId,
    /// Provenance: height of the commit decision.
    pub block_height: BlockHeight,
    /// Provenance: hash of that block.
    pub block_hash: String,
}

/// Provider response to order creation
#[derive(Clone, Debug)]
pub struct OrderReceipt {
    /// Provider-issued order identifier.
    pub order_id: String,
    /// Address the inscription fee must be paid to.
    pub payment_address: String,
    /// Amount due in satoshis.
    pub payment_amount: u64,
}

/// Fire-and-forget secondary asset-creation trigger
///
/// Invoked once per successful commit, detached from the tick. Failures are
/// logged by the caller and never affect proposal state.
#[async_trait]
pub trait TokenLauncher: Send + Sync {
    /// Kick off the secondary asset creation for a committed proposal.
    async fn launch(&self, proposal: Proposal) -> SchedulerResult<()>;
}
