//! Store backends.
//!
//! One physical store serves three ports: the scheduler's
//! [`CompetitionStore`](coronet_scheduler::CompetitionStore), the monitor's
//! [`ReconcileStore`](coronet_reconciler::ReconcileStore), and the ingress
//! [`ProposalDirectory`](crate::ports::ProposalDirectory). Each consumer
//! receives the same backend upcast to the one trait it owns, so column
//! ownership stays enforced even though the bytes live together.

mod memory;
mod rocks;

pub use memory::MemoryStore;
pub use rocks::{RocksConfig, RocksStore};
