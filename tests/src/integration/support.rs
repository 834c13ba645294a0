//! Shared fixtures for the integration flows.
//!
//! Scripted stand-ins for the two external collaborators: a chain whose tip
//! the test moves by hand, and a Commit Provider whose order statuses the
//! test sets per order id. Everything else in the flows is real production
//! code.

use async_trait::async_trait;
use coronet_reconciler::{
    OrderFile, OrderStatusGateway, OrderStatusSnapshot, ReconcilerError, ReconcilerResult,
};
use coronet_scheduler::{
    BlockInfo, ChainSource, CreateOrderRequest, OrderGateway, OrderReceipt, SchedulerError,
    SchedulerResult, TokenLauncher,
};
use parking_lot::RwLock;
use shared_types::{BlockHeight, Proposal};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Deterministic hash for a scripted block.
pub fn block_hash(height: BlockHeight) -> String {
    format!("hash-{height}")
}

/// Chain whose tip moves only when the test says so.
pub struct ScriptedChain {
    height: AtomicU64,
}

impl ScriptedChain {
    pub fn at(height: BlockHeight) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    pub fn advance_to(&self, height: BlockHeight) {
        self.height.store(height, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainSource for ScriptedChain {
    async fn current_height(&self) -> SchedulerResult<BlockHeight> {
        Ok(self.height.load(Ordering::SeqCst))
    }

    async fn block_at(&self, height: BlockHeight) -> SchedulerResult<BlockInfo> {
        Ok(BlockInfo {
            height,
            hash: block_hash(height),
            timestamp: 1_700_000_000 + height,
        })
    }
}

/// Commit Provider double serving both the creation and the polling side.
///
/// Creation hands out sequential `ord-N` ids; polling answers with whatever
/// snapshot the test scripted for that id, or a decode failure when nothing
/// was scripted.
pub struct ScriptedProvider {
    created: AtomicU32,
    polls: AtomicU32,
    fail_creation: AtomicBool,
    snapshots: RwLock<HashMap<String, OrderStatusSnapshot>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            created: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            fail_creation: AtomicBool::new(false),
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Make the next creation attempts fail.
    pub fn fail_creation(&self, fail: bool) {
        self.fail_creation.store(fail, Ordering::SeqCst);
    }

    /// Orders created so far.
    pub fn created(&self) -> u32 {
        self.created.load(Ordering::SeqCst)
    }

    /// Status polls answered so far.
    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    /// Script the status poll response for `order_id`.
    pub fn respond(&self, order_id: &str, snapshot: OrderStatusSnapshot) {
        self.snapshots
            .write()
            .insert(order_id.to_string(), snapshot);
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderGateway for ScriptedProvider {
    async fn create_order(&self, request: CreateOrderRequest) -> SchedulerResult<OrderReceipt> {
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(SchedulerError::OrderCreation {
                proposal_id: request.proposal_id,
                reason: "provider down".into(),
            });
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OrderReceipt {
            order_id: format!("ord-{n}"),
            payment_address: "bc1qtestpay".into(),
            payment_amount: 25_000,
        })
    }
}

#[async_trait]
impl OrderStatusGateway for ScriptedProvider {
    async fn order_status(&self, order_id: &str) -> ReconcilerResult<OrderStatusSnapshot> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.snapshots
            .read()
            .get(order_id)
            .cloned()
            .ok_or_else(|| ReconcilerError::BadResponse {
                reason: format!("unscripted order {order_id}"),
            })
    }
}

/// Snapshot with the given raw status and artifact files.
pub fn snapshot(status: &str, files: Vec<OrderFile>) -> OrderStatusSnapshot {
    OrderStatusSnapshot {
        status: status.to_string(),
        paid_amount: 25_000,
        total_amount: 25_000,
        files,
    }
}

/// Artifact entry as it appears once minting landed.
pub fn artifact(inscription_id: &str) -> OrderFile {
    OrderFile {
        inscription_id: Some(inscription_id.to_string()),
        inscription_url: Some(format!("https://ledger.example/{inscription_id}")),
        txid: Some("f00dbabe".to_string()),
    }
}

/// Launcher that counts invocations.
#[derive(Default)]
pub struct RecordingLauncher {
    launches: AtomicU32,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launches(&self) -> u32 {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenLauncher for RecordingLauncher {
    async fn launch(&self, _proposal: Proposal) -> SchedulerResult<()> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
