//! Order Reconciliation Monitor service - core business logic
//!
//! One cycle polls the Commit Provider for every unresolved order and
//! applies exactly one of four effects per order: complete, wait, fail, or
//! persist progress. Only explicit provider-reported terminal states mutate
//! proposals; transport errors abandon the order for the cycle and nothing
//! more.

use crate::domain::classify::{classify_outcome, OrderOutcome};
use crate::error::{ReconcilerError, ReconcilerResult};
use crate::metrics;
use crate::ports::outbound::{OrderStatusGateway, OrderStatusSnapshot, ReconcileStore};
use chrono::{DateTime, Utc};
use shared_types::{
    retry, FlightGuard, InscriptionOrder, OrderPatch, OrderStatus, ProposalStatus,
    ReconcilePatch, RetryPolicy,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Order Reconciliation Monitor configuration
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Cycle cadence. Shorter than the scheduler tick so order resolution
    /// outpaces block processing.
    pub cycle_interval: Duration,
    /// Delay before each provider call within a cycle.
    pub poll_gap: Duration,
    /// How long a terminal-looking order may wait for its artifact before
    /// being force-reset.
    pub stuck_after: Duration,
    /// Retry schedule for individual status polls.
    pub retry: RetryPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(90),
            poll_gap: Duration::from_millis(500),
            stuck_after: Duration::from_secs(3600),
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of one monitor cycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was still in flight; nothing was done.
    Skipped,
    /// The cycle ran to completion.
    Completed(CycleReport),
}

/// What a completed cycle did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Unresolved orders fetched at the start of the cycle.
    pub orders_seen: usize,
    /// Orders confirmed inscribed.
    pub completed: usize,
    /// Orders that reached a provider-reported terminal failure.
    pub failed: usize,
    /// Orders force-reset after the stuck window.
    pub stuck_reset: usize,
    /// Polls abandoned after exhausting retries.
    pub abandoned: usize,
}

/// Order Reconciliation Monitor service
///
/// Explicitly constructed and wired at process start; owns its single-flight
/// guard, while the runtime supervisor owns the driver task handle.
pub struct OrderReconciler {
    config: ReconcilerConfig,
    provider: Arc<dyn OrderStatusGateway>,
    store: Arc<dyn ReconcileStore>,
    cycle_in_flight: AtomicBool,
}

impl OrderReconciler {
    /// Create a new monitor over its two collaborators.
    pub fn new(
        config: ReconcilerConfig,
        provider: Arc<dyn OrderStatusGateway>,
        store: Arc<dyn ReconcileStore>,
    ) -> Self {
        Self {
            config,
            provider,
            store,
            cycle_in_flight: AtomicBool::new(false),
        }
    }

    /// Run one reconciliation cycle over every unresolved order.
    ///
    /// Overlap-safe: if a previous cycle is still running this returns
    /// [`CycleOutcome::Skipped`] immediately. Provider failures abandon the
    /// individual order for this cycle; store failures abort the cycle and
    /// the remaining orders wait for the next one.
    pub async fn run_cycle(&self) -> ReconcilerResult<CycleOutcome> {
        let Some(_guard) = FlightGuard::acquire(&self.cycle_in_flight) else {
            debug!("cycle already in flight, skipping");
            return Ok(CycleOutcome::Skipped);
        };

        let orders = self.store.unresolved_orders().await?;
        let mut report = CycleReport {
            orders_seen: orders.len(),
            ..CycleReport::default()
        };

        for order in orders {
            // Completed rows stay in the unresolved set but are never
            // polled or written again.
            if order.status == OrderStatus::Completed {
                continue;
            }

            tokio::time::sleep(self.config.poll_gap).await;
            metrics::record_order_polled();

            let snapshot = match retry(self.config.retry, ReconcilerError::is_retryable, || {
                self.provider.order_status(&order.order_id)
            })
            .await
            {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!(
                        order_id = %order.order_id,
                        error = %err,
                        "status poll abandoned for this cycle"
                    );
                    metrics::record_poll_failure();
                    report.abandoned += 1;
                    continue;
                }
            };

            if let Err(err) = self.apply(&order, &snapshot, &mut report).await {
                error!(
                    order_id = %order.order_id,
                    error = %err,
                    "reconciliation write failed, cycle aborted"
                );
                return Err(err);
            }
        }

        debug!(
            seen = report.orders_seen,
            completed = report.completed,
            failed = report.failed,
            stuck_reset = report.stuck_reset,
            abandoned = report.abandoned,
            "cycle complete"
        );
        Ok(CycleOutcome::Completed(report))
    }

    /// Start the periodic driver. The task ends when `shutdown` flips.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.cycle_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!(
                interval_secs = self.config.cycle_interval.as_secs(),
                "order reconciliation monitor started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = self.run_cycle().await {
                            debug!(error = %err, "cycle ended early");
                        }
                    }
                    _ = shutdown.changed() => {
                        info!("order reconciliation monitor stopped");
                        break;
                    }
                }
            }
        })
    }

    async fn apply(
        &self,
        order: &InscriptionOrder,
        snapshot: &OrderStatusSnapshot,
        report: &mut CycleReport,
    ) -> ReconcilerResult<()> {
        match classify_outcome(snapshot) {
            OrderOutcome::Inscribed {
                inscription_id,
                inscription_url,
                txid,
            } => {
                self.complete(order, inscription_id, inscription_url, txid)
                    .await?;
                report.completed += 1;
            }
            OrderOutcome::AwaitingArtifact => {
                if self.is_stuck(order, Utc::now()) {
                    self.reset_stuck(order).await?;
                    report.stuck_reset += 1;
                } else {
                    debug!(
                        order_id = %order.order_id,
                        status = %snapshot.status,
                        "terminal status without artifact yet, still waiting"
                    );
                    self.persist_progress(order, &snapshot.status).await?;
                }
            }
            OrderOutcome::Failed => {
                self.fail(order, &snapshot.status).await?;
                report.failed += 1;
            }
            OrderOutcome::InFlight => {
                self.persist_progress(order, &snapshot.status).await?;
            }
        }
        Ok(())
    }

    /// Terminal success: proposal first, then the order row. A crash between
    /// the two leaves the order unresolved and re-polled, never the proposal
    /// stranded in inscribing.
    async fn complete(
        &self,
        order: &InscriptionOrder,
        inscription_id: String,
        inscription_url: Option<String>,
        txid: Option<String>,
    ) -> ReconcilerResult<()> {
        match self.store.proposal(order.proposal_id).await? {
            Some(p) if p.status == ProposalStatus::Inscribed => {}
            Some(_) => {
                self.store
                    .update_proposal(order.proposal_id, ReconcilePatch::inscribed())
                    .await?;
            }
            None => {
                warn!(
                    proposal_id = order.proposal_id,
                    order_id = %order.order_id,
                    "completed order has no owning proposal"
                );
            }
        }

        self.store
            .update_order(
                order.id,
                OrderPatch::completed(inscription_id.as_str(), inscription_url, txid),
            )
            .await?;

        info!(
            order_id = %order.order_id,
            proposal_id = order.proposal_id,
            inscription_id = %inscription_id,
            "artifact confirmed, proposal inscribed"
        );
        metrics::record_order_completed();
        Ok(())
    }

    /// Provider-reported terminal failure: reset the proposal, then mark the
    /// order so it is never polled again.
    async fn fail(&self, order: &InscriptionOrder, raw_status: &str) -> ReconcilerResult<()> {
        self.reset_proposal(order).await?;
        self.store
            .update_order(
                order.id,
                OrderPatch::status(OrderStatus::Failed(raw_status.to_string())),
            )
            .await?;

        warn!(
            order_id = %order.order_id,
            proposal_id = order.proposal_id,
            status = raw_status,
            "provider reported terminal failure, proposal returned to contention"
        );
        metrics::record_order_failed();
        Ok(())
    }

    /// Stuck window elapsed with no artifact: treat as failure.
    async fn reset_stuck(&self, order: &InscriptionOrder) -> ReconcilerResult<()> {
        self.reset_proposal(order).await?;
        self.store
            .update_order(order.id, OrderPatch::status(OrderStatus::StuckTimeoutAutoReset))
            .await?;

        warn!(
            order_id = %order.order_id,
            proposal_id = order.proposal_id,
            "no artifact within the stuck window, order force-reset"
        );
        metrics::record_order_stuck_reset();
        Ok(())
    }

    async fn persist_progress(
        &self,
        order: &InscriptionOrder,
        raw_status: &str,
    ) -> ReconcilerResult<()> {
        self.store
            .update_order(
                order.id,
                OrderPatch::status(OrderStatus::InProgress(raw_status.to_string())),
            )
            .await
    }

    async fn reset_proposal(&self, order: &InscriptionOrder) -> ReconcilerResult<()> {
        match self.store.proposal(order.proposal_id).await? {
            Some(_) => {
                self.store
                    .update_proposal(order.proposal_id, ReconcilePatch::reset_to_contention())
                    .await
            }
            None => {
                warn!(
                    proposal_id = order.proposal_id,
                    order_id = %order.order_id,
                    "failed order has no owning proposal"
                );
                Ok(())
            }
        }
    }

    fn is_stuck(&self, order: &InscriptionOrder, now: DateTime<Utc>) -> bool {
        order
            .age(now)
            .to_std()
            .map(|age| age > self.config.stuck_after)
            .unwrap_or(false)
    }
}
