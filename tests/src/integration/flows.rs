//! # Competition Flows
//!
//! End-to-end lifecycle tests driving the real Competition Scheduler and
//! Order Reconciliation Monitor over one shared in-memory store, with the
//! chain tip and provider responses scripted per step.
//!
//! ## Flows Covered
//!
//! 1. **Happy path**: submit → vote → crown → survive → commit → artifact
//!    → inscribed
//! 2. **Commit failure**: the failed height is retried, leadership history
//!    survives the rollback
//! 3. **Provider failure**: proposal returns to contention and wins again
//!    with a fresh order
//! 4. **Stuck window**: terminal-looking orders without an artifact wait,
//!    then force-reset
//! 5. **Pipeline overlap**: a runner-up is crowned while the winner's order
//!    is still in flight

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use coronet_reconciler::{
        CycleOutcome, CycleReport, OrderReconciler, ReconcilerConfig, ReconcileStore,
    };
    use coronet_runtime::{DirectoryError, MemoryStore, ProposalDirectory, ProposalDraft};
    use coronet_scheduler::{
        CompetitionScheduler, CompetitionStore, SchedulerConfig, SchedulerError, TickOutcome,
        TickReport,
    };
    use shared_types::{
        BlockHeight, InscriptionOrder, OrderStatus, Proposal, ProposalId, ProposalStatus,
    };

    use crate::integration::support::{
        artifact, snapshot, RecordingLauncher, ScriptedChain, ScriptedProvider,
    };

    // =============================================================================
    // TEST RIG
    // =============================================================================

    /// Both services wired over one store, driven by hand.
    struct Rig {
        chain: Arc<ScriptedChain>,
        store: Arc<MemoryStore>,
        provider: Arc<ScriptedProvider>,
        launcher: Arc<RecordingLauncher>,
        scheduler: CompetitionScheduler,
        monitor: OrderReconciler,
    }

    fn create_rig(tip: BlockHeight, stuck_after: Duration) -> Rig {
        let chain = Arc::new(ScriptedChain::at(tip));
        let store = Arc::new(MemoryStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let launcher = Arc::new(RecordingLauncher::new());

        let scheduler = CompetitionScheduler::new(
            SchedulerConfig::default(),
            chain.clone(),
            store.clone(),
            provider.clone(),
            launcher.clone(),
        );
        let monitor = OrderReconciler::new(
            ReconcilerConfig {
                poll_gap: Duration::ZERO,
                stuck_after,
                ..ReconcilerConfig::default()
            },
            provider.clone(),
            store.clone(),
        );

        Rig {
            chain,
            store,
            provider,
            launcher,
            scheduler,
            monitor,
        }
    }

    /// Rig whose stuck window never elapses within a test.
    fn create_patient_rig(tip: BlockHeight) -> Rig {
        create_rig(tip, Duration::from_secs(3600))
    }

    async fn tick(rig: &Rig) -> TickReport {
        match rig.scheduler.run_tick().await.unwrap() {
            TickOutcome::Completed(report) => report,
            TickOutcome::Skipped => panic!("tick unexpectedly skipped"),
        }
    }

    async fn cycle(rig: &Rig) -> CycleReport {
        match rig.monitor.run_cycle().await.unwrap() {
            CycleOutcome::Completed(report) => report,
            CycleOutcome::Skipped => panic!("cycle unexpectedly skipped"),
        }
    }

    async fn submit(rig: &Rig, name: &str, ticker: &str) -> Proposal {
        rig.store
            .submit_proposal(ProposalDraft {
                name: name.to_string(),
                ticker: ticker.to_string(),
                description: format!("{name} entry"),
            })
            .await
            .unwrap()
    }

    async fn vote_n(rig: &Rig, id: ProposalId, times: u64) -> Proposal {
        let mut last = fetch(rig, id).await;
        for _ in 0..times {
            last = rig.store.cast_vote(id).await.unwrap();
        }
        last
    }

    async fn fetch(rig: &Rig, id: ProposalId) -> Proposal {
        ProposalDirectory::proposal(rig.store.as_ref(), id)
            .await
            .unwrap()
    }

    async fn open_orders(rig: &Rig) -> Vec<InscriptionOrder> {
        rig.store.unresolved_orders().await.unwrap()
    }

    async fn cursor(rig: &Rig) -> Option<BlockHeight> {
        rig.store
            .block_tracker()
            .await
            .unwrap()
            .map(|t| t.last_processed_block)
    }

    /// The launch trigger runs detached; give it a few schedule points.
    async fn wait_for_launches(rig: &Rig, expected: u32) {
        for _ in 0..64 {
            if rig.launcher.launches() >= expected {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("launch trigger never fired");
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_winning_proposal_reaches_inscribed_end_to_end() {
        let rig = create_patient_rig(840_000);

        // First tick pins the cursor at the tip; nothing historical runs.
        let report = tick(&rig).await;
        assert_eq!(report.blocks_processed, 0);
        assert_eq!(cursor(&rig).await, Some(840_000));

        let winner = submit(&rig, "Cosmic Hamster", "CHAM").await;
        let runner_up = submit(&rig, "Runner Up", "RUP").await;
        assert_eq!(winner.creation_block, 840_000);

        let voted = vote_n(&rig, winner.id, 3).await;
        assert_eq!(voted.total_votes, 3);
        vote_n(&rig, runner_up.id, 1).await;

        // Block 840_001: the top proposal is crowned, the runner-up keeps
        // contending untouched.
        rig.chain.advance_to(840_001);
        let report = tick(&rig).await;
        assert_eq!(report.blocks_processed, 1);

        let crowned = fetch(&rig, winner.id).await;
        assert_eq!(crowned.status, ProposalStatus::Leader);
        assert_eq!(crowned.leader_start_block, Some(840_001));
        assert_eq!(crowned.leaderboard_min_blocks, 2);
        assert_eq!(crowned.expiration_block, Some(840_006));
        assert_eq!(
            fetch(&rig, runner_up.id).await.status,
            ProposalStatus::Active
        );
        assert!(open_orders(&rig).await.is_empty());

        // Block 840_002: survived its window, committed to the ledger.
        rig.chain.advance_to(840_002);
        tick(&rig).await;

        assert_eq!(
            fetch(&rig, winner.id).await.status,
            ProposalStatus::Inscribing
        );
        assert_eq!(rig.provider.created(), 1);
        wait_for_launches(&rig, 1).await;

        let orders = open_orders(&rig).await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "ord-1");
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[0].block_height, 840_002);
        assert_eq!(orders[0].payment_address, "bc1qtestpay");

        // Provider still working on it: progress is persisted, nothing else.
        rig.provider.respond("ord-1", snapshot("pending", vec![]));
        let report = cycle(&rig).await;
        assert_eq!(report.orders_seen, 1);
        assert_eq!(report.completed, 0);
        assert_eq!(
            open_orders(&rig).await[0].status,
            OrderStatus::InProgress("pending".into())
        );
        assert_eq!(
            fetch(&rig, winner.id).await.status,
            ProposalStatus::Inscribing
        );

        // Artifact lands: proposal inscribed, order completed.
        rig.provider
            .respond("ord-1", snapshot("minted", vec![artifact("insc-1i0")]));
        let report = cycle(&rig).await;
        assert_eq!(report.completed, 1);

        assert_eq!(
            fetch(&rig, winner.id).await.status,
            ProposalStatus::Inscribed
        );
        let orders = open_orders(&rig).await;
        assert_eq!(orders[0].status, OrderStatus::Completed);
        assert_eq!(orders[0].inscription_id.as_deref(), Some("insc-1i0"));
        assert_eq!(orders[0].txid.as_deref(), Some("f00dbabe"));

        // Terminal proposals take no more votes.
        let err = rig.store.cast_vote(winner.id).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Conflict { .. }));

        // Completed rows stay visible but are never polled again.
        let polls_before = rig.provider.polls();
        let report = cycle(&rig).await;
        assert_eq!(report.orders_seen, 1);
        assert_eq!(rig.provider.polls(), polls_before);
    }

    #[tokio::test]
    async fn test_failed_commit_retries_the_same_height() {
        let rig = create_patient_rig(500);
        tick(&rig).await;
        let p = submit(&rig, "Retry Me", "RTRY").await;
        vote_n(&rig, p.id, 2).await;

        rig.provider.fail_creation(true);
        rig.chain.advance_to(502);

        // Block 501 crowns; block 502 commits and fails. The cursor must
        // not cross the failed height.
        let err = rig.scheduler.run_tick().await.unwrap_err();
        assert!(matches!(err, SchedulerError::OrderCreation { .. }));
        assert_eq!(cursor(&rig).await, Some(501));

        let rolled_back = fetch(&rig, p.id).await;
        assert_eq!(rolled_back.status, ProposalStatus::Active);
        assert_eq!(rolled_back.leader_start_block, Some(501));
        assert!(open_orders(&rig).await.is_empty());
        assert_eq!(rig.launcher.launches(), 0);

        // Provider recovers: the same height replays and commits, without
        // re-crowning.
        rig.provider.fail_creation(false);
        let report = tick(&rig).await;
        assert_eq!(report.blocks_processed, 1);
        assert_eq!(cursor(&rig).await, Some(502));

        assert_eq!(fetch(&rig, p.id).await.status, ProposalStatus::Inscribing);
        assert_eq!(rig.provider.created(), 1);
        assert_eq!(open_orders(&rig).await.len(), 1);
        wait_for_launches(&rig, 1).await;
    }

    #[tokio::test]
    async fn test_provider_failure_returns_proposal_to_contention() {
        let rig = create_patient_rig(700);
        tick(&rig).await;
        let p = submit(&rig, "Second Chance", "CHNC").await;
        vote_n(&rig, p.id, 2).await;

        rig.chain.advance_to(701);
        tick(&rig).await;
        rig.chain.advance_to(702);
        tick(&rig).await;
        assert_eq!(fetch(&rig, p.id).await.status, ProposalStatus::Inscribing);

        // Provider cancels the order: proposal back to contention with its
        // leadership history wiped, failed row out of the unresolved set.
        rig.provider.respond("ord-1", snapshot("canceled", vec![]));
        let report = cycle(&rig).await;
        assert_eq!(report.failed, 1);

        let reset = fetch(&rig, p.id).await;
        assert_eq!(reset.status, ProposalStatus::Active);
        assert_eq!(reset.leader_start_block, None);
        assert_eq!(reset.expiration_block, None);
        assert!(open_orders(&rig).await.is_empty());

        // Still the top proposal: it wins again from scratch.
        rig.chain.advance_to(703);
        tick(&rig).await;
        let recrowned = fetch(&rig, p.id).await;
        assert_eq!(recrowned.status, ProposalStatus::Leader);
        assert_eq!(recrowned.leader_start_block, Some(703));

        rig.chain.advance_to(704);
        tick(&rig).await;
        assert_eq!(rig.provider.created(), 2);

        rig.provider
            .respond("ord-2", snapshot("confirmed", vec![artifact("insc-2i0")]));
        let report = cycle(&rig).await;
        assert_eq!(report.completed, 1);

        assert_eq!(fetch(&rig, p.id).await.status, ProposalStatus::Inscribed);
        let orders = open_orders(&rig).await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "ord-2");
        assert_eq!(orders[0].status, OrderStatus::Completed);
        wait_for_launches(&rig, 2).await;
    }

    #[tokio::test]
    async fn test_terminal_status_without_artifact_keeps_waiting() {
        let rig = create_patient_rig(300);
        tick(&rig).await;
        let p = submit(&rig, "Slow Mint", "SLOW").await;
        vote_n(&rig, p.id, 1).await;
        rig.chain.advance_to(302);
        tick(&rig).await;

        // Success vocabulary, but no artifact attached yet.
        rig.provider.respond("ord-1", snapshot("minted", vec![]));
        let report = cycle(&rig).await;
        assert_eq!(report.completed, 0);
        assert_eq!(report.stuck_reset, 0);

        assert_eq!(fetch(&rig, p.id).await.status, ProposalStatus::Inscribing);
        assert_eq!(
            open_orders(&rig).await[0].status,
            OrderStatus::InProgress("minted".into())
        );
    }

    #[tokio::test]
    async fn test_stuck_order_is_force_reset() {
        // A zero stuck window makes every artifactless wait overdue.
        let rig = create_rig(300, Duration::ZERO);
        tick(&rig).await;
        let p = submit(&rig, "Wedged", "WDGD").await;
        vote_n(&rig, p.id, 1).await;
        rig.chain.advance_to(302);
        tick(&rig).await;

        rig.provider.respond("ord-1", snapshot("minted", vec![]));
        let report = cycle(&rig).await;
        assert_eq!(report.stuck_reset, 1);

        let reset = fetch(&rig, p.id).await;
        assert_eq!(reset.status, ProposalStatus::Active);
        assert_eq!(reset.leader_start_block, None);
        assert!(open_orders(&rig).await.is_empty());
    }

    #[tokio::test]
    async fn test_second_winner_commits_while_first_order_in_flight() {
        let rig = create_patient_rig(900);
        tick(&rig).await;
        let first = submit(&rig, "First Wave", "FRST").await;
        let second = submit(&rig, "Second Wave", "SCND").await;
        vote_n(&rig, first.id, 3).await;
        vote_n(&rig, second.id, 2).await;

        rig.chain.advance_to(901);
        tick(&rig).await;
        rig.chain.advance_to(902);
        tick(&rig).await;
        assert_eq!(
            fetch(&rig, first.id).await.status,
            ProposalStatus::Inscribing
        );

        // With the winner out of contention, the runner-up takes the crown
        // while the first order is still unresolved.
        rig.chain.advance_to(903);
        tick(&rig).await;
        assert_eq!(fetch(&rig, second.id).await.status, ProposalStatus::Leader);

        rig.chain.advance_to(904);
        tick(&rig).await;
        assert_eq!(
            fetch(&rig, second.id).await.status,
            ProposalStatus::Inscribing
        );

        let orders = open_orders(&rig).await;
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_id, "ord-1");
        assert_eq!(orders[1].order_id, "ord-2");

        // Both artifacts land in one cycle.
        rig.provider
            .respond("ord-1", snapshot("minted", vec![artifact("insc-a")]));
        rig.provider
            .respond("ord-2", snapshot("minted", vec![artifact("insc-b")]));
        let report = cycle(&rig).await;
        assert_eq!(report.orders_seen, 2);
        assert_eq!(report.completed, 2);

        assert_eq!(
            fetch(&rig, first.id).await.status,
            ProposalStatus::Inscribed
        );
        assert_eq!(
            fetch(&rig, second.id).await.status,
            ProposalStatus::Inscribed
        );
        wait_for_launches(&rig, 2).await;
    }
}
