//! # Persistence Flows
//!
//! Restart behavior over the RocksDB backend: the block cursor, leadership
//! state, and unresolved orders must survive a process restart, so a
//! reopened node resumes exactly where the previous one stopped instead of
//! re-pinning at the tip or dropping in-flight commits.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use coronet_reconciler::{
        CycleOutcome, CycleReport, OrderReconciler, ReconcilerConfig, ReconcileStore,
    };
    use coronet_runtime::{ProposalDirectory, ProposalDraft, RocksConfig, RocksStore};
    use coronet_scheduler::{CompetitionScheduler, SchedulerConfig, TickOutcome, TickReport};
    use shared_types::{OrderStatus, ProposalId, ProposalStatus};
    use tempfile::TempDir;

    use crate::integration::support::{
        artifact, snapshot, RecordingLauncher, ScriptedChain, ScriptedProvider,
    };

    fn open(dir: &TempDir) -> Arc<RocksStore> {
        Arc::new(RocksStore::open(RocksConfig::for_testing(dir.path())).unwrap())
    }

    fn create_scheduler(
        chain: &Arc<ScriptedChain>,
        store: &Arc<RocksStore>,
        provider: &Arc<ScriptedProvider>,
    ) -> CompetitionScheduler {
        CompetitionScheduler::new(
            SchedulerConfig::default(),
            chain.clone(),
            store.clone(),
            provider.clone(),
            Arc::new(RecordingLauncher::new()),
        )
    }

    fn create_monitor(store: &Arc<RocksStore>, provider: &Arc<ScriptedProvider>) -> OrderReconciler {
        OrderReconciler::new(
            ReconcilerConfig {
                poll_gap: Duration::ZERO,
                ..ReconcilerConfig::default()
            },
            provider.clone(),
            store.clone(),
        )
    }

    async fn tick(scheduler: &CompetitionScheduler) -> TickReport {
        match scheduler.run_tick().await.unwrap() {
            TickOutcome::Completed(report) => report,
            TickOutcome::Skipped => panic!("tick unexpectedly skipped"),
        }
    }

    async fn cycle(monitor: &OrderReconciler) -> CycleReport {
        match monitor.run_cycle().await.unwrap() {
            CycleOutcome::Completed(report) => report,
            CycleOutcome::Skipped => panic!("cycle unexpectedly skipped"),
        }
    }

    async fn submit_and_vote(store: &Arc<RocksStore>, votes: u64) -> ProposalId {
        let p = store
            .submit_proposal(ProposalDraft {
                name: "Restart Survivor".into(),
                ticker: "RSRV".into(),
                description: "persistence entry".into(),
            })
            .await
            .unwrap();
        for _ in 0..votes {
            store.cast_vote(p.id).await.unwrap();
        }
        p.id
    }

    #[tokio::test]
    async fn test_cursor_and_leadership_survive_restart() {
        let dir = TempDir::new().unwrap();
        let chain = Arc::new(ScriptedChain::at(100));
        let provider = Arc::new(ScriptedProvider::new());

        let winner_id = {
            let store = open(&dir);
            let scheduler = create_scheduler(&chain, &store, &provider);

            tick(&scheduler).await;
            let id = submit_and_vote(&store, 2).await;

            chain.advance_to(101);
            tick(&scheduler).await;

            let p = ProposalDirectory::proposal(store.as_ref(), id)
                .await
                .unwrap();
            assert_eq!(p.status, ProposalStatus::Leader);
            assert_eq!(p.leader_start_block, Some(101));
            id
        };

        // New process over the same directory, one block later. A re-pinned
        // cursor would see zero blocks to process and never commit.
        chain.advance_to(102);
        let store = open(&dir);
        let scheduler = create_scheduler(&chain, &store, &provider);

        let report = tick(&scheduler).await;
        assert_eq!(report.blocks_processed, 1);
        assert_eq!(report.cursor, 102);

        // The persisted survival window completed, so 102 committed.
        let p = ProposalDirectory::proposal(store.as_ref(), winner_id)
            .await
            .unwrap();
        assert_eq!(p.status, ProposalStatus::Inscribing);
        assert_eq!(provider.created(), 1);

        let orders = store.unresolved_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].block_height, 102);
    }

    #[tokio::test]
    async fn test_unresolved_order_is_reconciled_after_restart() {
        let dir = TempDir::new().unwrap();
        let chain = Arc::new(ScriptedChain::at(200));
        let provider = Arc::new(ScriptedProvider::new());

        let (winner_id, order_id) = {
            let store = open(&dir);
            let scheduler = create_scheduler(&chain, &store, &provider);

            tick(&scheduler).await;
            let id = submit_and_vote(&store, 1).await;
            chain.advance_to(201);
            tick(&scheduler).await;
            chain.advance_to(202);
            tick(&scheduler).await;

            let orders = store.unresolved_orders().await.unwrap();
            assert_eq!(orders.len(), 1);
            (id, orders[0].order_id.clone())
        };

        // Only the monitor comes back up; the order row was left pending.
        let store = open(&dir);
        let monitor = create_monitor(&store, &provider);

        let pending = store.unresolved_orders().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, OrderStatus::Pending);

        provider.respond(&order_id, snapshot("minted", vec![artifact("insc-r1")]));
        let report = cycle(&monitor).await;
        assert_eq!(report.completed, 1);

        let p = ProposalDirectory::proposal(store.as_ref(), winner_id)
            .await
            .unwrap();
        assert_eq!(p.status, ProposalStatus::Inscribed);

        let resolved = store.unresolved_orders().await.unwrap();
        assert_eq!(resolved[0].status, OrderStatus::Completed);
        assert_eq!(resolved[0].inscription_id.as_deref(), Some("insc-r1"));
    }
}
