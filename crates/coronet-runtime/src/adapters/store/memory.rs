//! In-memory store backend.
//!
//! BTreeMaps behind one `parking_lot::RwLock`. Patches are applied under the
//! write lock, so each read-modify-write is atomic per record, same as the
//! rocksdb backend. State dies with the process; this backend exists for
//! tests and local runs.

use crate::ports::{
    DirectoryError, DirectoryResult, ProposalDirectory, ProposalDraft, StatusCounts,
    StatusSummary,
};
use async_trait::async_trait;
use chrono::Utc;
use coronet_reconciler::{ReconcileStore, ReconcilerError, ReconcilerResult};
use coronet_scheduler::{CompetitionStore, NewOrder, SchedulerError, SchedulerResult};
use parking_lot::RwLock;
use shared_types::{
    BlockHeight, BlockTracker, CompetitionPatch, InscriptionOrder, OrderPatch, OrderRowId,
    OrderStatus, Proposal, ProposalId, ProposalStatus, ReconcilePatch,
};
use std::collections::BTreeMap;

#[derive(Default)]
struct MemoryState {
    proposals: BTreeMap<ProposalId, Proposal>,
    orders: BTreeMap<OrderRowId, InscriptionOrder>,
    tracker: Option<BlockTracker>,
    next_proposal_id: ProposalId,
    next_order_id: OrderRowId,
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Empty store with ids starting at 1.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_proposal_id: 1,
                next_order_id: 1,
                ..MemoryState::default()
            }),
        }
    }

    fn sorted_by_votes(mut rows: Vec<Proposal>) -> Vec<Proposal> {
        rows.sort_by(|a, b| b.total_votes.cmp(&a.total_votes).then(a.id.cmp(&b.id)));
        rows
    }
}

#[async_trait]
impl CompetitionStore for MemoryStore {
    async fn proposals_with_status(
        &self,
        statuses: &[ProposalStatus],
    ) -> SchedulerResult<Vec<Proposal>> {
        let rows = self
            .state
            .read()
            .proposals
            .values()
            .filter(|p| statuses.contains(&p.status))
            .cloned()
            .collect();
        Ok(Self::sorted_by_votes(rows))
    }

    async fn update_proposal(
        &self,
        id: ProposalId,
        patch: CompetitionPatch,
    ) -> SchedulerResult<()> {
        let mut state = self.state.write();
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(SchedulerError::ProposalNotFound { proposal_id: id })?;
        patch.apply(proposal);
        Ok(())
    }

    async fn open_order_for(
        &self,
        proposal_id: ProposalId,
    ) -> SchedulerResult<Option<InscriptionOrder>> {
        Ok(self
            .state
            .read()
            .orders
            .values()
            .filter(|o| o.proposal_id == proposal_id && !o.status.is_terminal())
            .max_by_key(|o| o.id)
            .cloned())
    }

    async fn insert_order(&self, order: NewOrder) -> SchedulerResult<OrderRowId> {
        let mut state = self.state.write();
        let id = state.next_order_id;
        state.next_order_id += 1;
        state.orders.insert(
            id,
            InscriptionOrder {
                id,
                proposal_id: order.proposal_id,
                block_height: order.block_height,
                block_hash: order.block_hash,
                order_id: order.order_id,
                status: OrderStatus::Pending,
                payment_address: order.payment_address,
                payment_amount: order.payment_amount,
                inscription_id: None,
                inscription_url: None,
                txid: None,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn block_tracker(&self) -> SchedulerResult<Option<BlockTracker>> {
        Ok(self.state.read().tracker.clone())
    }

    async fn advance_tracker(&self, height: BlockHeight, hash: &str) -> SchedulerResult<()> {
        let mut state = self.state.write();
        if let Some(tracker) = &state.tracker {
            if height < tracker.last_processed_block {
                return Err(SchedulerError::TrackerRegression {
                    current: tracker.last_processed_block,
                    requested: height,
                });
            }
        }
        state.tracker = Some(BlockTracker::at(height, hash));
        Ok(())
    }
}

#[async_trait]
impl ReconcileStore for MemoryStore {
    async fn unresolved_orders(&self) -> ReconcilerResult<Vec<InscriptionOrder>> {
        // BTreeMap iterates in key order; row ids are assigned in insertion
        // order, so this is already oldest first.
        Ok(self
            .state
            .read()
            .orders
            .values()
            .filter(|o| !o.status.is_terminal_failure())
            .cloned()
            .collect())
    }

    async fn update_order(&self, id: OrderRowId, patch: OrderPatch) -> ReconcilerResult<()> {
        let mut state = self.state.write();
        let order = state.orders.get_mut(&id).ok_or(ReconcilerError::Store {
            reason: format!("order row {id} not found"),
        })?;
        patch.apply(order);
        Ok(())
    }

    async fn proposal(&self, id: ProposalId) -> ReconcilerResult<Option<Proposal>> {
        Ok(self.state.read().proposals.get(&id).cloned())
    }

    async fn update_proposal(&self, id: ProposalId, patch: ReconcilePatch) -> ReconcilerResult<()> {
        let mut state = self.state.write();
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(ReconcilerError::ProposalNotFound { proposal_id: id })?;
        patch.apply(proposal);
        Ok(())
    }
}

#[async_trait]
impl ProposalDirectory for MemoryStore {
    async fn submit_proposal(&self, draft: ProposalDraft) -> DirectoryResult<Proposal> {
        let mut state = self.state.write();
        let creation_block = state
            .tracker
            .as_ref()
            .map(|t| t.last_processed_block)
            .unwrap_or(0);
        let id = state.next_proposal_id;
        state.next_proposal_id += 1;

        let proposal = Proposal::new(id, draft.name, draft.ticker, draft.description, creation_block);
        state.proposals.insert(id, proposal.clone());
        Ok(proposal)
    }

    async fn cast_vote(&self, id: ProposalId) -> DirectoryResult<Proposal> {
        let mut state = self.state.write();
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound { proposal_id: id })?;
        if !proposal.status.is_contending() {
            return Err(DirectoryError::Conflict {
                proposal_id: id,
                status: proposal.status,
            });
        }
        proposal.total_votes += 1;
        Ok(proposal.clone())
    }

    async fn list_proposals(&self) -> DirectoryResult<Vec<Proposal>> {
        let rows = self.state.read().proposals.values().cloned().collect();
        Ok(Self::sorted_by_votes(rows))
    }

    async fn proposal(&self, id: ProposalId) -> DirectoryResult<Proposal> {
        self.state
            .read()
            .proposals
            .get(&id)
            .cloned()
            .ok_or(DirectoryError::NotFound { proposal_id: id })
    }

    async fn reject_proposal(&self, id: ProposalId) -> DirectoryResult<Proposal> {
        let mut state = self.state.write();
        let proposal = state
            .proposals
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound { proposal_id: id })?;
        if proposal.status != ProposalStatus::Active {
            return Err(DirectoryError::Conflict {
                proposal_id: id,
                status: proposal.status,
            });
        }
        proposal.status = ProposalStatus::Rejected;
        Ok(proposal.clone())
    }

    async fn status_summary(&self) -> DirectoryResult<StatusSummary> {
        let state = self.state.read();
        let mut counts = StatusCounts::default();
        for proposal in state.proposals.values() {
            counts.record(proposal.status);
        }
        Ok(StatusSummary {
            last_processed_block: state.tracker.as_ref().map(|t| t.last_processed_block),
            last_processed_hash: state.tracker.as_ref().map(|t| t.last_processed_hash.clone()),
            proposals: counts,
        })
    }
}
