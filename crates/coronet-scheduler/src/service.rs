//! Competition Scheduler service - core business logic
//!
//! One tick reads the chain tip and processes every block the cursor has not
//! seen, in ascending order. One block runs the leadership sequence: expire,
//! select, dethrone, crown or commit. The block tracker advances only after
//! a height fully completes, so a failed height is retried on the next tick.

use crate::domain::leaderboard;
use crate::error::{SchedulerError, SchedulerResult};
use crate::metrics;
use crate::ports::outbound::{
    BlockInfo, ChainSource, CompetitionStore, CreateOrderRequest, NewOrder, OrderGateway,
    TokenLauncher,
};
use chrono::Utc;
use shared_types::{
    BlockHeight, CompetitionPatch, FlightGuard, Proposal, ProposalStatus,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Competition scheduler configuration
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Tick cadence.
    pub tick_interval: Duration,
    /// Blocks an active proposal may wait without being crowned.
    pub expire_after_blocks: u64,
    /// Minimum votes required to be considered for leadership.
    pub min_votes_to_lead: u64,
    /// Survival threshold stamped onto a proposal at crowning. This value,
    /// not the schema default on the row, is what survival checks read.
    pub leaderboard_min_blocks: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(120),
            expire_after_blocks: 5,
            min_votes_to_lead: 1,
            leaderboard_min_blocks: 2,
        }
    }
}

/// Outcome of one scheduler tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Another tick was still in flight; nothing was done.
    Skipped,
    /// The tick ran to completion.
    Completed(TickReport),
}

/// What a completed tick did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tip height observed at the start of the tick.
    pub observed_height: BlockHeight,
    /// Number of blocks fully processed this tick.
    pub blocks_processed: u64,
    /// Cursor position when the tick ended.
    pub cursor: BlockHeight,
}

/// Competition Scheduler service
///
/// Explicitly constructed and wired at process start; owns its single-flight
/// guard, while the runtime supervisor owns the driver task handle.
pub struct CompetitionScheduler {
    config: SchedulerConfig,
    chain: Arc<dyn ChainSource>,
    store: Arc<dyn CompetitionStore>,
    orders: Arc<dyn OrderGateway>,
    launcher: Arc<dyn TokenLauncher>,
    tick_in_flight: AtomicBool,
}

impl CompetitionScheduler {
    /// Create a new scheduler over its four collaborators.
    pub fn new(
        config: SchedulerConfig,
        chain: Arc<dyn ChainSource>,
        store: Arc<dyn CompetitionStore>,
        orders: Arc<dyn OrderGateway>,
        launcher: Arc<dyn TokenLauncher>,
    ) -> Self {
        Self {
            config,
            chain,
            store,
            orders,
            launcher,
            tick_in_flight: AtomicBool::new(false),
        }
    }

    /// Run one tick: catch the cursor up to the current tip.
    ///
    /// Overlap-safe: if a previous tick is still running this returns
    /// [`TickOutcome::Skipped`] immediately. On a block failure the error is
    /// returned and the cursor stays below the failed height, so the same
    /// block is retried on the next tick.
    pub async fn run_tick(&self) -> SchedulerResult<TickOutcome> {
        let Some(_guard) = FlightGuard::acquire(&self.tick_in_flight) else {
            debug!("tick already in flight, skipping");
            return Ok(TickOutcome::Skipped);
        };

        let observed_height = self.chain.current_height().await?;

        let Some(tracker) = self.store.block_tracker().await? else {
            // First boot: pin the cursor at the tip and process nothing
            // historical.
            let tip = self.chain.block_at(observed_height).await?;
            self.store.advance_tracker(tip.height, &tip.hash).await?;
            info!(height = observed_height, "block tracker initialized at tip");
            return Ok(TickOutcome::Completed(TickReport {
                observed_height,
                blocks_processed: 0,
                cursor: observed_height,
            }));
        };

        let mut cursor = tracker.last_processed_block;
        let mut blocks_processed = 0u64;

        while cursor < observed_height {
            let height = cursor + 1;
            let block = self.chain.block_at(height).await?;

            if let Err(err) = self.process_block(&block).await {
                error!(height, error = %err, "block processing failed, height will be retried");
                return Err(err);
            }

            self.store.advance_tracker(height, &block.hash).await?;
            cursor = height;
            blocks_processed += 1;
            metrics::record_block_processed(height);
        }

        debug!(
            cursor,
            blocks_processed, "tick complete, cursor caught up to tip"
        );
        Ok(TickOutcome::Completed(TickReport {
            observed_height,
            blocks_processed,
            cursor,
        }))
    }

    /// Run the leadership sequence for a single block.
    ///
    /// Idempotent at the same height: re-running it cannot crown twice or
    /// create a second order for a proposal that already owns an open one.
    pub async fn process_block(&self, block: &BlockInfo) -> SchedulerResult<()> {
        let height = block.height;

        // 1. Age out actives that never reached the leaderboard.
        self.expire_stale_actives(height).await?;

        // 2. Pick the contender among everything still in the race.
        let contending = self
            .store
            .proposals_with_status(&[ProposalStatus::Active, ProposalStatus::Leader])
            .await?;
        let Some(contender) =
            leaderboard::select_contender(&contending, self.config.min_votes_to_lead)
        else {
            debug!(height, "no eligible contender");
            return Ok(());
        };
        let contender = contender.clone();

        // 3. Every other current leader lost its one shot.
        self.dethrone_losers(&contending, &contender, height)
            .await?;

        // 4. An open order means this contender is already being committed.
        if let Some(order) = self.store.open_order_for(contender.id).await? {
            debug!(
                height,
                proposal_id = contender.id,
                order_id = %order.order_id,
                "contender already owns an open order"
            );
            return Ok(());
        }

        // 5. First crowning starts the survival window; nothing else happens
        //    this block.
        if !contender.has_led() {
            return self.crown(&contender, height).await;
        }

        // 6. The survival window must elapse before the win is real.
        if !leaderboard::has_survived(&contender, height) {
            debug!(
                height,
                proposal_id = contender.id,
                leader_start_block = contender.leader_start_block,
                "leader has not survived long enough yet"
            );
            return Ok(());
        }

        // 7. Survived: commit to the ledger.
        self.commit(&contender, block).await
    }

    /// Start the periodic driver. The task ends when `shutdown` flips.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.tick_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!(
                interval_secs = self.config.tick_interval.as_secs(),
                "competition scheduler started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = self.run_tick().await {
                            debug!(error = %err, "tick ended early");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("competition scheduler stopped");
                        break;
                    }
                }
            }
        })
    }

    async fn expire_stale_actives(&self, height: BlockHeight) -> SchedulerResult<()> {
        let actives = self
            .store
            .proposals_with_status(&[ProposalStatus::Active])
            .await?;

        for stale in leaderboard::stale_actives(&actives, height, self.config.expire_after_blocks)
        {
            info!(
                height,
                proposal_id = stale.id,
                creation_block = stale.creation_block,
                "proposal expired before reaching the leaderboard"
            );
            self.store
                .update_proposal(stale.id, CompetitionPatch::status(ProposalStatus::Expired))
                .await?;
            metrics::record_proposal_expired("stale");
        }
        Ok(())
    }

    async fn dethrone_losers(
        &self,
        contending: &[Proposal],
        winner: &Proposal,
        height: BlockHeight,
    ) -> SchedulerResult<()> {
        for loser in leaderboard::losing_leaders(contending, winner.id) {
            warn!(
                height,
                proposal_id = loser.id,
                winner_id = winner.id,
                "leader dethroned, eliminated"
            );
            self.store
                .update_proposal(loser.id, CompetitionPatch::status(ProposalStatus::Expired))
                .await?;
            metrics::record_proposal_expired("dethroned");
        }
        Ok(())
    }

    async fn crown(&self, contender: &Proposal, height: BlockHeight) -> SchedulerResult<()> {
        let expiration_block = height + self.config.expire_after_blocks;
        let patch = CompetitionPatch::crown(
            Utc::now(),
            height,
            self.config.leaderboard_min_blocks,
            expiration_block,
        );
        self.store.update_proposal(contender.id, patch).await?;

        info!(
            height,
            proposal_id = contender.id,
            votes = contender.total_votes,
            min_blocks = self.config.leaderboard_min_blocks,
            "new leader crowned"
        );
        metrics::record_leader_crowned();
        Ok(())
    }

    async fn commit(&self, contender: &Proposal, block: &BlockInfo) -> SchedulerResult<()> {
        let height = block.height;
        info!(
            height,
            proposal_id = contender.id,
            votes = contender.total_votes,
            "leader survived its window, committing to the ledger"
        );

        self.store
            .update_proposal(
                contender.id,
                CompetitionPatch::status(ProposalStatus::Inscribing),
            )
            .await?;

        let request = CreateOrderRequest {
            correlation_id: Uuid::new_v4(),
            name: contender.name.clone(),
            ticker: contender.ticker.clone(),
            description: contender.description.clone(),
            total_votes: contender.total_votes,
            proposal_id: contender.id,
            block_height: height,
            block_hash: block.hash.clone(),
        };

        let receipt = match self.orders.create_order(request).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!(
                    height,
                    proposal_id = contender.id,
                    error = %err,
                    "order creation failed, returning proposal to contention"
                );
                metrics::record_commit_failure();
                self.rollback_to_contention(contender.id).await;
                return Err(err);
            }
        };

        let row = NewOrder {
            proposal_id: contender.id,
            block_height: height,
            block_hash: block.hash.clone(),
            order_id: receipt.order_id.clone(),
            payment_address: receipt.payment_address,
            payment_amount: receipt.payment_amount,
        };

        if let Err(err) = self.store.insert_order(row).await {
            error!(
                height,
                proposal_id = contender.id,
                order_id = %receipt.order_id,
                error = %err,
                "order row insert failed, returning proposal to contention"
            );
            metrics::record_commit_failure();
            self.rollback_to_contention(contender.id).await;
            return Err(err);
        }

        info!(
            height,
            proposal_id = contender.id,
            order_id = %receipt.order_id,
            "inscription order created"
        );
        metrics::record_order_created();

        // The launch trigger runs detached; its failures never touch
        // proposal state.
        let launcher = Arc::clone(&self.launcher);
        let mut snapshot = contender.clone();
        snapshot.status = ProposalStatus::Inscribing;
        tokio::spawn(async move {
            let proposal_id = snapshot.id;
            if let Err(err) = launcher.launch(snapshot).await {
                warn!(proposal_id, error = %err, "launch trigger failed");
            }
        });

        Ok(())
    }

    /// Best-effort rollback after a failed commit. The original error is the
    /// one worth propagating, so a rollback failure is only logged.
    async fn rollback_to_contention(&self, proposal_id: shared_types::ProposalId) {
        if let Err(err) = self
            .store
            .update_proposal(proposal_id, CompetitionPatch::status(ProposalStatus::Active))
            .await
        {
            error!(
                proposal_id,
                error = %err,
                "rollback failed, proposal stays in inscribing until the height is retried"
            );
        }
    }
}
