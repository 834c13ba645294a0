//! Outbound ports - interfaces the Order Reconciliation Monitor depends on
//!
//! The monitor reads order status from the Commit Provider and writes the
//! consequences back through the store. Its store port accepts only
//! [`ReconcilePatch`] and [`OrderPatch`], so the monitor cannot write any
//! field the scheduler owns.

use async_trait::async_trait;
use serde::Deserialize;
use shared_types::{
    InscriptionOrder, OrderPatch, OrderRowId, Proposal, ProposalId, ReconcilePatch,
};

use crate::error::ReconcilerResult;

// =============================================================================
// COMMIT PROVIDER (read side)
// =============================================================================

/// One artifact entry in a provider status snapshot.
///
/// The provider attaches files once minting lands; until then the list is
/// empty or the entries carry no inscription id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderFile {
    /// Ledger artifact identifier, present once the inscription exists.
    pub inscription_id: Option<String>,
    /// Public URL of the artifact.
    pub inscription_url: Option<String>,
    /// Commitment transaction id.
    pub txid: Option<String>,
}

/// Provider status snapshot for one order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderStatusSnapshot {
    /// Raw provider status string; vocabulary is provider-defined.
    pub status: String,
    /// Satoshis the provider has seen paid so far.
    pub paid_amount: u64,
    /// Total satoshis due.
    pub total_amount: u64,
    /// Attached artifacts, empty until minting lands.
    pub files: Vec<OrderFile>,
}

/// Read access to the Commit Provider's order status endpoint.
#[async_trait]
pub trait OrderStatusGateway: Send + Sync {
    /// Fetch the current status snapshot for a provider order id.
    async fn order_status(&self, order_id: &str) -> ReconcilerResult<OrderStatusSnapshot>;
}

// =============================================================================
// PERSISTENT STORE
// =============================================================================

/// Store operations available to the monitor.
#[async_trait]
pub trait ReconcileStore: Send + Sync {
    /// Every order not yet carrying a terminal-failure marker, oldest first.
    ///
    /// Completed orders are included; the monitor skips them without a
    /// provider call.
    async fn unresolved_orders(&self) -> ReconcilerResult<Vec<InscriptionOrder>>;

    /// Apply a monitor patch to one order row.
    async fn update_order(&self, id: OrderRowId, patch: OrderPatch) -> ReconcilerResult<()>;

    /// Fetch one proposal.
    async fn proposal(&self, id: ProposalId) -> ReconcilerResult<Option<Proposal>>;

    /// Apply a monitor patch to one proposal.
    async fn update_proposal(
        &self,
        id: ProposalId,
        patch: ReconcilePatch,
    ) -> ReconcilerResult<()>;
}
