//! # coronet-reconciler
//!
//! Order Reconciliation Monitor: the provider-polling recovery loop.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Status Polling**: every unresolved order is checked against the
//!   Commit Provider each cycle, with bounded retries and backoff
//! - **Four-Way Classification**: complete, wait for artifact, fail, or
//!   persist progress
//! - **Automatic Recovery**: provider-terminal failures and stuck orders
//!   return their proposal to open contention; nothing stays wedged in
//!   `inscribing`
//! - **Local-Error Isolation**: transport failures abandon an order for one
//!   cycle and never mutate state
//!
//! ## Architecture
//!
//! ```text
//! Commit Provider ──order_status──→ Monitor
//!                                      │
//!                                      ├── ReconcilePatch ──→ Store (proposals)
//!                                      └── OrderPatch ──────→ Store (orders)
//! ```
//!
//! ## Per-Order Classification
//!
//! ```text
//! success + artifact → inscribed (terminal)
//! success, no artifact → wait; past stuck window → force-reset
//! failure vocabulary → proposal reset + order failed (terminal)
//! anything else → persist raw status, poll again next cycle
//! ```
//!
//! Proposal writes precede order writes in both terminal paths, so a crash
//! between the two leaves the order re-polled rather than the proposal
//! stranded.
//!
//! ## Example
//!
//! ```rust,ignore
//! use coronet_reconciler::{OrderReconciler, ReconcilerConfig};
//!
//! let monitor = OrderReconciler::new(ReconcilerConfig::default(), provider, store);
//!
//! // Drive manually (tests) ...
//! let outcome = monitor.run_cycle().await?;
//!
//! // ... or periodically (runtime).
//! let handle = monitor.spawn(shutdown_rx);
//! ```

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::classify;
pub use error::{ReconcilerError, ReconcilerResult};
pub use ports::outbound::{OrderFile, OrderStatusGateway, OrderStatusSnapshot, ReconcileStore};
pub use service::{CycleOutcome, CycleReport, OrderReconciler, ReconcilerConfig};
