//! Domain module for the Competition Scheduler
//!
//! ## Core Modules
//! - leaderboard: contender selection, staleness, survival arithmetic

pub mod leaderboard;

pub use leaderboard::{has_survived, losing_leaders, select_contender, stale_actives};
