//! RocksDB store backend.
//!
//! ## Column Families
//!
//! - `proposals` - competition entries, keyed by big-endian row id
//! - `orders` - inscription orders, keyed by big-endian row id
//! - `tracker` - the singleton block cursor
//!
//! Rows are bincode-encoded. Big-endian keys keep forward iteration in row-id
//! order, which doubles as oldest-first for orders. Row ids continue across
//! restarts: the counters are seeded from the last key of each column family
//! at open.
//!
//! The cursor write is the one durability point that matters for resume
//! semantics, so tracker advances are fsynced (configurable off for tests);
//! row writes ride the WAL.

use crate::ports::{
    DirectoryError, DirectoryResult, ProposalDirectory, ProposalDraft, StatusCounts,
    StatusSummary,
};
use async_trait::async_trait;
use chrono::Utc;
use coronet_reconciler::{ReconcileStore, ReconcilerError, ReconcilerResult};
use coronet_scheduler::{CompetitionStore, NewOrder, SchedulerError, SchedulerResult};
use parking_lot::RwLock;
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteOptions, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    BlockHeight, BlockTracker, CompetitionPatch, InscriptionOrder, OrderPatch, OrderRowId,
    OrderStatus, Proposal, ProposalId, ProposalStatus, ReconcilePatch,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Column family for proposal rows.
pub const CF_PROPOSALS: &str = "proposals";
/// Column family for inscription order rows.
pub const CF_ORDERS: &str = "orders";
/// Column family holding the singleton cursor.
pub const CF_TRACKER: &str = "tracker";

const COLUMN_FAMILIES: &[&str] = &[CF_PROPOSALS, CF_ORDERS, CF_TRACKER];

const TRACKER_KEY: &[u8] = b"cursor";

/// RocksDB tuning for the store.
#[derive(Debug, Clone)]
pub struct RocksConfig {
    /// Path to the database directory.
    pub path: String,
    /// Block cache size in bytes.
    pub block_cache_size: usize,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// fsync tracker advances.
    pub sync_tracker_writes: bool,
}

impl Default for RocksConfig {
    fn default() -> Self {
        Self {
            path: "./data/coronet".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_tracker_writes: true,
        }
    }
}

impl RocksConfig {
    /// Config rooted at `path` with production tuning.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Self::default()
        }
    }

    /// Small buffers, no fsync. Tests only.
    pub fn for_testing(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_tracker_writes: false,
        }
    }
}

/// RocksDB-backed store serving all three store ports.
pub struct RocksStore {
    db: Arc<RwLock<DB>>,
    config: RocksConfig,
    next_proposal_id: AtomicU64,
    next_order_id: AtomicU64,
}

impl RocksStore {
    /// Open or create the database at `config.path`.
    pub fn open(config: RocksConfig) -> anyhow::Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)?;
        let next_proposal_id = Self::last_row_id(&db, CF_PROPOSALS)? + 1;
        let next_order_id = Self::last_row_id(&db, CF_ORDERS)? + 1;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            config,
            next_proposal_id: AtomicU64::new(next_proposal_id),
            next_order_id: AtomicU64::new(next_order_id),
        })
    }

    /// Highest row id present in `cf`, or 0 when empty.
    fn last_row_id(db: &DB, cf: &str) -> anyhow::Result<u64> {
        let handle = db
            .cf_handle(cf)
            .ok_or_else(|| anyhow::anyhow!("missing column family {cf}"))?;
        match db.iterator_cf(handle, IteratorMode::End).next() {
            Some(Ok((key, _))) => {
                let bytes: [u8; 8] = key
                    .as_ref()
                    .try_into()
                    .map_err(|_| anyhow::anyhow!("malformed row key in {cf}"))?;
                Ok(u64::from_be_bytes(bytes))
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(0),
        }
    }

    fn row_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    // The raw accessors take the DB guard from the caller, so a
    // read-modify-write can hold the write lock across both halves.

    fn get_row<T: DeserializeOwned>(db: &DB, cf: &str, key: &[u8]) -> Result<Option<T>, String> {
        let handle = db.cf_handle(cf).ok_or_else(|| format!("missing column family {cf}"))?;
        match db.get_cf(handle, key) {
            Ok(Some(bytes)) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| format!("corrupt row in {cf}: {e}")),
            Ok(None) => Ok(None),
            Err(e) => Err(format!("get failed in {cf}: {e}")),
        }
    }

    fn put_row<T: Serialize>(
        db: &DB,
        cf: &str,
        key: &[u8],
        row: &T,
        sync: bool,
    ) -> Result<(), String> {
        let handle = db.cf_handle(cf).ok_or_else(|| format!("missing column family {cf}"))?;
        let bytes = bincode::serialize(row).map_err(|e| format!("encode failed for {cf}: {e}"))?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(sync);
        db.put_cf_opt(handle, key, bytes, &write_opts)
            .map_err(|e| format!("put failed in {cf}: {e}"))
    }

    fn all_rows<T: DeserializeOwned>(db: &DB, cf: &str) -> Result<Vec<T>, String> {
        let handle = db.cf_handle(cf).ok_or_else(|| format!("missing column family {cf}"))?;
        let mut rows = Vec::new();
        for item in db.iterator_cf(handle, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| format!("scan failed in {cf}: {e}"))?;
            rows.push(
                bincode::deserialize(&value).map_err(|e| format!("corrupt row in {cf}: {e}"))?,
            );
        }
        Ok(rows)
    }

    fn modify_proposal<E>(
        &self,
        id: ProposalId,
        apply: impl FnOnce(&mut Proposal),
        map_err: impl Fn(String) -> E,
        missing: E,
    ) -> Result<Proposal, E> {
        let db = self.db.write();
        let mut proposal: Proposal = Self::get_row(&db, CF_PROPOSALS, &Self::row_key(id))
            .map_err(&map_err)?
            .ok_or(missing)?;
        apply(&mut proposal);
        Self::put_row(&db, CF_PROPOSALS, &Self::row_key(id), &proposal, false).map_err(&map_err)?;
        Ok(proposal)
    }

    fn sorted_by_votes(mut rows: Vec<Proposal>) -> Vec<Proposal> {
        rows.sort_by(|a, b| b.total_votes.cmp(&a.total_votes).then(a.id.cmp(&b.id)));
        rows
    }
}

#[async_trait]
impl CompetitionStore for RocksStore {
    async fn proposals_with_status(
        &self,
        statuses: &[ProposalStatus],
    ) -> SchedulerResult<Vec<Proposal>> {
        let db = self.db.read();
        let rows: Vec<Proposal> = Self::all_rows(&db, CF_PROPOSALS)
            .map_err(|reason| SchedulerError::Store { reason })?;
        Ok(Self::sorted_by_votes(
            rows.into_iter()
                .filter(|p| statuses.contains(&p.status))
                .collect(),
        ))
    }

    async fn update_proposal(
        &self,
        id: ProposalId,
        patch: CompetitionPatch,
    ) -> SchedulerResult<()> {
        self.modify_proposal(
            id,
            |p| patch.apply(p),
            |reason| SchedulerError::Store { reason },
            SchedulerError::ProposalNotFound { proposal_id: id },
        )?;
        Ok(())
    }

    async fn open_order_for(
        &self,
        proposal_id: ProposalId,
    ) -> SchedulerResult<Option<InscriptionOrder>> {
        let db = self.db.read();
        let rows: Vec<InscriptionOrder> =
            Self::all_rows(&db, CF_ORDERS).map_err(|reason| SchedulerError::Store { reason })?;
        Ok(rows
            .into_iter()
            .filter(|o| o.proposal_id == proposal_id && !o.status.is_terminal())
            .max_by_key(|o| o.id))
    }

    async fn insert_order(&self, order: NewOrder) -> SchedulerResult<OrderRowId> {
        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let row = InscriptionOrder {
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
        };
        let db = self.db.write();
        Self::put_row(&db, CF_ORDERS, &Self::row_key(id), &row, false)
            .map_err(|reason| SchedulerError::Store { reason })?;
        Ok(id)
    }

    async fn block_tracker(&self) -> SchedulerResult<Option<BlockTracker>> {
        let db = self.db.read();
        Self::get_row(&db, CF_TRACKER, TRACKER_KEY)
            .map_err(|reason| SchedulerError::Store { reason })
    }

    async fn advance_tracker(&self, height: BlockHeight, hash: &str) -> SchedulerResult<()> {
        let db = self.db.write();
        let current: Option<BlockTracker> = Self::get_row(&db, CF_TRACKER, TRACKER_KEY)
            .map_err(|reason| SchedulerError::Store { reason })?;
        if let Some(tracker) = current {
            if height < tracker.last_processed_block {
                return Err(SchedulerError::TrackerRegression {
                    current: tracker.last_processed_block,
                    requested: height,
                });
            }
        }
        Self::put_row(
            &db,
            CF_TRACKER,
            TRACKER_KEY,
            &BlockTracker::at(height, hash),
            self.config.sync_tracker_writes,
        )
        .map_err(|reason| SchedulerError::Store { reason })
    }
}

#[async_trait]
impl ReconcileStore for RocksStore {
    async fn unresolved_orders(&self) -> ReconcilerResult<Vec<InscriptionOrder>> {
        let db = self.db.read();
        let rows: Vec<InscriptionOrder> =
            Self::all_rows(&db, CF_ORDERS).map_err(|reason| ReconcilerError::Store { reason })?;
        // Key order is row-id order, so this stays oldest first.
        Ok(rows
            .into_iter()
            .filter(|o| !o.status.is_terminal_failure())
            .collect())
    }

    async fn update_order(&self, id: OrderRowId, patch: OrderPatch) -> ReconcilerResult<()> {
        let db = self.db.write();
        let mut order: InscriptionOrder = Self::get_row(&db, CF_ORDERS, &Self::row_key(id))
            .map_err(|reason| ReconcilerError::Store { reason })?
            .ok_or(ReconcilerError::Store {
                reason: format!("order row {id} not found"),
            })?;
        patch.apply(&mut order);
        Self::put_row(&db, CF_ORDERS, &Self::row_key(id), &order, false)
            .map_err(|reason| ReconcilerError::Store { reason })
    }

    async fn proposal(&self, id: ProposalId) -> ReconcilerResult<Option<Proposal>> {
        let db = self.db.read();
        Self::get_row(&db, CF_PROPOSALS, &Self::row_key(id))
            .map_err(|reason| ReconcilerError::Store { reason })
    }

    async fn update_proposal(&self, id: ProposalId, patch: ReconcilePatch) -> ReconcilerResult<()> {
        self.modify_proposal(
            id,
            |p| patch.apply(p),
            |reason| ReconcilerError::Store { reason },
            ReconcilerError::ProposalNotFound { proposal_id: id },
        )?;
        Ok(())
    }
}

#[async_trait]
impl ProposalDirectory for RocksStore {
    async fn submit_proposal(&self, draft: ProposalDraft) -> DirectoryResult<Proposal> {
        let id = self.next_proposal_id.fetch_add(1, Ordering::SeqCst);
        let db = self.db.write();
        let creation_block = Self::get_row::<BlockTracker>(&db, CF_TRACKER, TRACKER_KEY)
            .map_err(|reason| DirectoryError::Store { reason })?
            .map(|t| t.last_processed_block)
            .unwrap_or(0);

        let proposal = Proposal::new(id, draft.name, draft.ticker, draft.description, creation_block);
        Self::put_row(&db, CF_PROPOSALS, &Self::row_key(id), &proposal, false)
            .map_err(|reason| DirectoryError::Store { reason })?;
        Ok(proposal)
    }

    async fn cast_vote(&self, id: ProposalId) -> DirectoryResult<Proposal> {
        let mut blocked = None;
        let voted = self.modify_proposal(
            id,
            |p| {
                if p.status.is_contending() {
                    p.total_votes += 1;
                } else {
                    blocked = Some(p.status);
                }
            },
            |reason| DirectoryError::Store { reason },
            DirectoryError::NotFound { proposal_id: id },
        )?;
        match blocked {
            Some(status) => Err(DirectoryError::Conflict {
                proposal_id: id,
                status,
            }),
            None => Ok(voted),
        }
    }

    async fn list_proposals(&self) -> DirectoryResult<Vec<Proposal>> {
        let db = self.db.read();
        let rows = Self::all_rows(&db, CF_PROPOSALS)
            .map_err(|reason| DirectoryError::Store { reason })?;
        Ok(Self::sorted_by_votes(rows))
    }

    async fn proposal(&self, id: ProposalId) -> DirectoryResult<Proposal> {
        let db = self.db.read();
        Self::get_row(&db, CF_PROPOSALS, &Self::row_key(id))
            .map_err(|reason| DirectoryError::Store { reason })?
            .ok_or(DirectoryError::NotFound { proposal_id: id })
    }

    async fn reject_proposal(&self, id: ProposalId) -> DirectoryResult<Proposal> {
        let mut blocked = None;
        let rejected = self.modify_proposal(
            id,
            |p| {
                if p.status == ProposalStatus::Active {
                    p.status = ProposalStatus::Rejected;
                } else {
                    blocked = Some(p.status);
                }
            },
            |reason| DirectoryError::Store { reason },
            DirectoryError::NotFound { proposal_id: id },
        )?;
        match blocked {
            Some(status) => Err(DirectoryError::Conflict {
                proposal_id: id,
                status,
            }),
            None => Ok(rejected),
        }
    }

    async fn status_summary(&self) -> DirectoryResult<StatusSummary> {
        let db = self.db.read();
        let rows: Vec<Proposal> = Self::all_rows(&db, CF_PROPOSALS)
            .map_err(|reason| DirectoryError::Store { reason })?;
        let tracker: Option<BlockTracker> = Self::get_row(&db, CF_TRACKER, TRACKER_KEY)
            .map_err(|reason| DirectoryError::Store { reason })?;

        let mut counts = StatusCounts::default();
        for proposal in &rows {
            counts.record(proposal.status);
        }
        Ok(StatusSummary {
            last_processed_block: tracker.as_ref().map(|t| t.last_processed_block),
            last_processed_hash: tracker.map(|t| t.last_processed_hash),
            proposals: counts,
        })
    }
}
