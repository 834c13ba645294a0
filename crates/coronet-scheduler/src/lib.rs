//! # coronet-scheduler
//!
//! Competition Scheduler: the block-driven leadership state machine.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Leaderboard**: top-voted selection with deterministic tie-breaking
//! - **Survival Window**: a leader must hold the top spot for
//!   `leaderboard_min_blocks` consecutive blocks before winning
//! - **Commit Pipeline**: surviving leaders become inscription orders on the
//!   external ledger
//! - **At-Least-Once Blocks**: a crashed height is retried on the next tick,
//!   never skipped
//!
//! ## Architecture
//!
//! ```text
//! Chain Source ──current_height/block_at──→ Scheduler
//!                                               │
//!                                               ├── CompetitionPatch ──→ Store
//!                                               ├── CreateOrderRequest ──→ Order Gateway
//!                                               └── launch(proposal) ──→ Token Launcher (detached)
//! ```
//!
//! ## Per-Block Sequence
//!
//! ```text
//! expire stale actives → select contender → dethrone losers
//!     → skip if open order → crown first-timers → survival check → commit
//! ```
//!
//! Every step short-circuits the rest of the block when its condition ends
//! the story: no contender means nothing to crown, a fresh crown means
//! survival starts next block, a failed survival check means wait.
//!
//! ## Example
//!
//! ```rust,ignore
//! use coronet_scheduler::{CompetitionScheduler, SchedulerConfig};
//!
//! let scheduler = CompetitionScheduler::new(
//!     SchedulerConfig::default(),
//!     chain,
//!     store,
//!     orders,
//!     launcher,
//! );
//!
//! // Drive manually (tests) ...
//! let outcome = scheduler.run_tick().await?;
//!
//! // ... or periodically (runtime).
//! let handle = scheduler.spawn(shutdown_rx);
//! ```

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::leaderboard;
pub use error::{SchedulerError, SchedulerResult};
pub use ports::outbound::{
    BlockInfo, ChainSource, CompetitionStore, CreateOrderRequest, NewOrder, OrderGateway,
    OrderReceipt, TokenLauncher,
};
pub use service::{CompetitionScheduler, SchedulerConfig, TickOutcome, TickReport};
