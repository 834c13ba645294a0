//! # Scheduler Metrics
//!
//! Prometheus metrics for monitoring competition progress and health.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! coronet-scheduler = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `scheduler_blocks_processed_total` - Counter of fully processed blocks
//! - `scheduler_proposals_expired_total` - Counter of expired proposals (by reason)
//! - `scheduler_leaders_crowned_total` - Counter of first crownings
//! - `scheduler_orders_created_total` - Counter of inscription orders created
//! - `scheduler_commit_failures_total` - Counter of failed commit attempts
//! - `scheduler_last_processed_block` - Gauge of the block cursor

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, CounterVec, Gauge, IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total blocks fully processed
    pub static ref BLOCKS_PROCESSED: IntCounter = register_int_counter!(
        "scheduler_blocks_processed_total",
        "Total number of blocks fully processed"
    )
    .expect("Failed to create BLOCKS_PROCESSED metric");

    /// Total proposals expired, labeled by reason
    pub static ref PROPOSALS_EXPIRED: CounterVec = register_counter_vec!(
        "scheduler_proposals_expired_total",
        "Total number of proposals expired",
        &["reason"]
    )
    .expect("Failed to create PROPOSALS_EXPIRED metric");

    /// Total first crownings
    pub static ref LEADERS_CROWNED: IntCounter = register_int_counter!(
        "scheduler_leaders_crowned_total",
        "Total number of proposals crowned leader for the first time"
    )
    .expect("Failed to create LEADERS_CROWNED metric");

    /// Total inscription orders created
    pub static ref ORDERS_CREATED: IntCounter = register_int_counter!(
        "scheduler_orders_created_total",
        "Total number of inscription orders created"
    )
    .expect("Failed to create ORDERS_CREATED metric");

    /// Total failed commit attempts
    pub static ref COMMIT_FAILURES: IntCounter = register_int_counter!(
        "scheduler_commit_failures_total",
        "Total number of commit attempts that rolled back"
    )
    .expect("Failed to create COMMIT_FAILURES metric");

    /// Current block cursor
    pub static ref LAST_PROCESSED_BLOCK: Gauge = register_gauge!(
        "scheduler_last_processed_block",
        "Height of the last fully processed block"
    )
    .expect("Failed to create LAST_PROCESSED_BLOCK metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a fully processed block
#[cfg(feature = "metrics")]
pub fn record_block_processed(height: u64) {
    BLOCKS_PROCESSED.inc();
    LAST_PROCESSED_BLOCK.set(height as f64);
}

/// Record an expired proposal with reason ("stale" or "dethroned")
#[cfg(feature = "metrics")]
pub fn record_proposal_expired(reason: &str) {
    PROPOSALS_EXPIRED.with_label_values(&[reason]).inc();
}

/// Record a first crowning
#[cfg(feature = "metrics")]
pub fn record_leader_crowned() {
    LEADERS_CROWNED.inc();
}

/// Record a created inscription order
#[cfg(feature = "metrics")]
pub fn record_order_created() {
    ORDERS_CREATED.inc();
}

/// Record a commit attempt that rolled back
#[cfg(feature = "metrics")]
pub fn record_commit_failure() {
    COMMIT_FAILURES.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_block_processed(_height: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_proposal_expired(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_leader_crowned() {}

#[cfg(not(feature = "metrics"))]
pub fn record_order_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_commit_failure() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_noop_when_disabled() {
        // These should compile and run without panic even without metrics feature
        record_block_processed(840_000);
        record_proposal_expired("stale");
        record_proposal_expired("dethroned");
        record_leader_crowned();
        record_order_created();
        record_commit_failure();
    }
}
