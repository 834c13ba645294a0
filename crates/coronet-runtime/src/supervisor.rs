//! Process supervisor.
//!
//! Builds the whole object graph from a [`RuntimeConfig`] and owns its
//! lifetime: pick a store backend, construct the adapters, wire the two core
//! services, start their periodic drivers plus the ingress API, and tear
//! everything down on one shutdown signal.
//!
//! ```text
//!                  ┌── CompetitionScheduler ──┬─→ EsploraChainSource
//!   Supervisor ────┤                          ├─→ HttpOrderProvider ←─┐
//!                  ├── OrderReconciler ───────┘                       │
//!                  └── ingress API ──→ ProposalDirectory              │
//!                                          │                          │
//!                                       store (memory | rocksdb) ─────┘
//! ```

use crate::adapters::chain::EsploraChainSource;
use crate::adapters::launch::{NoopLauncher, WebhookLauncher};
use crate::adapters::provider::HttpOrderProvider;
use crate::adapters::store::{MemoryStore, RocksConfig, RocksStore};
use crate::api;
use crate::config::{RuntimeConfig, StoreBackend};
use crate::ports::ProposalDirectory;
use anyhow::{Context, Result};
use coronet_reconciler::{OrderReconciler, ReconcileStore};
use coronet_scheduler::{CompetitionScheduler, CompetitionStore, TokenLauncher};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Running process: both service drivers plus the ingress API.
pub struct Supervisor {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
    api_addr: Option<SocketAddr>,
}

impl Supervisor {
    /// Validate the configuration, build the object graph, and start every
    /// task. Returns once the process is fully up.
    pub async fn start(config: RuntimeConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        match config.store.backend {
            StoreBackend::Memory => {
                info!("using in-memory store, state will not survive restarts");
                Self::wire(config, Arc::new(MemoryStore::new())).await
            }
            StoreBackend::Rocks => {
                let rocks_config = RocksConfig::at(&config.store.data_dir);
                info!(path = %rocks_config.path, "opening rocksdb store");
                let store = RocksStore::open(rocks_config).context("failed to open rocksdb")?;
                Self::wire(config, Arc::new(store)).await
            }
        }
    }

    async fn wire<S>(config: RuntimeConfig, store: Arc<S>) -> Result<Self>
    where
        S: CompetitionStore + ReconcileStore + ProposalDirectory + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut handles = Vec::new();

        let chain = Arc::new(
            EsploraChainSource::new(&config.chain).context("failed to build chain source")?,
        );
        let provider = Arc::new(
            HttpOrderProvider::new(&config.provider).context("failed to build order provider")?,
        );
        let launcher: Arc<dyn TokenLauncher> = match &config.launch.webhook_url {
            Some(url) => {
                info!(url = %url, "launch webhook enabled");
                Arc::new(WebhookLauncher::new(url.clone()).context("failed to build launcher")?)
            }
            None => Arc::new(NoopLauncher),
        };

        let scheduler = Arc::new(CompetitionScheduler::new(
            config.scheduler.clone(),
            chain,
            store.clone(),
            provider.clone(),
            launcher,
        ));
        handles.push(scheduler.spawn(shutdown_rx.clone()));

        let reconciler = Arc::new(OrderReconciler::new(
            config.reconciler.clone(),
            provider,
            store.clone(),
        ));
        handles.push(reconciler.spawn(shutdown_rx.clone()));

        let api_addr = if config.api.enabled {
            let router = api::router(store);
            let listener = tokio::net::TcpListener::bind(config.api.bind)
                .await
                .with_context(|| format!("failed to bind ingress API to {}", config.api.bind))?;
            let addr = listener.local_addr()?;
            info!(addr = %addr, "ingress API listening");

            let mut api_shutdown = shutdown_rx;
            handles.push(tokio::spawn(async move {
                let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
                    let _ = api_shutdown.changed().await;
                });
                if let Err(e) = serve.await {
                    error!(error = %e, "ingress API server error");
                }
            }));
            Some(addr)
        } else {
            info!("ingress API disabled");
            None
        };

        Ok(Self {
            shutdown_tx,
            handles,
            api_addr,
        })
    }

    /// Address the ingress API actually bound to, if enabled.
    pub fn api_addr(&self) -> Option<SocketAddr> {
        self.api_addr
    }

    /// Signal every task and wait for them to finish.
    pub async fn shutdown(self) {
        info!("initiating graceful shutdown");
        if self.shutdown_tx.send(true).is_err() {
            error!("all tasks already gone before shutdown signal");
        }
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("shutdown complete");
    }
}
