//! # Reconciler Metrics
//!
//! Prometheus metrics for monitoring order reconciliation health.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! coronet-reconciler = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `reconciler_orders_polled_total` - Counter of provider status polls
//! - `reconciler_poll_failures_total` - Counter of polls abandoned after retries
//! - `reconciler_orders_completed_total` - Counter of orders confirmed inscribed
//! - `reconciler_orders_failed_total` - Counter of provider-terminal failures
//! - `reconciler_orders_stuck_reset_total` - Counter of stuck-window auto-resets

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total provider status polls attempted
    pub static ref ORDERS_POLLED: IntCounter = register_int_counter!(
        "reconciler_orders_polled_total",
        "Total number of provider status polls"
    )
    .expect("Failed to create ORDERS_POLLED metric");

    /// Total polls abandoned after exhausting retries
    pub static ref POLL_FAILURES: IntCounter = register_int_counter!(
        "reconciler_poll_failures_total",
        "Total number of status polls abandoned after retries"
    )
    .expect("Failed to create POLL_FAILURES metric");

    /// Total orders confirmed inscribed
    pub static ref ORDERS_COMPLETED: IntCounter = register_int_counter!(
        "reconciler_orders_completed_total",
        "Total number of orders confirmed inscribed"
    )
    .expect("Failed to create ORDERS_COMPLETED metric");

    /// Total provider-reported terminal failures
    pub static ref ORDERS_FAILED: IntCounter = register_int_counter!(
        "reconciler_orders_failed_total",
        "Total number of orders reaching a provider-reported terminal failure"
    )
    .expect("Failed to create ORDERS_FAILED metric");

    /// Total stuck-window auto-resets
    pub static ref ORDERS_STUCK_RESET: IntCounter = register_int_counter!(
        "reconciler_orders_stuck_reset_total",
        "Total number of orders force-reset after the stuck-order window"
    )
    .expect("Failed to create ORDERS_STUCK_RESET metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a provider status poll
#[cfg(feature = "metrics")]
pub fn record_order_polled() {
    ORDERS_POLLED.inc();
}

/// Record a poll abandoned after exhausting retries
#[cfg(feature = "metrics")]
pub fn record_poll_failure() {
    POLL_FAILURES.inc();
}

/// Record an order confirmed inscribed
#[cfg(feature = "metrics")]
pub fn record_order_completed() {
    ORDERS_COMPLETED.inc();
}

/// Record a provider-reported terminal failure
#[cfg(feature = "metrics")]
pub fn record_order_failed() {
    ORDERS_FAILED.inc();
}

/// Record a stuck-window auto-reset
#[cfg(feature = "metrics")]
pub fn record_order_stuck_reset() {
    ORDERS_STUCK_RESET.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_order_polled() {}

#[cfg(not(feature = "metrics"))]
pub fn record_poll_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_order_completed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_order_failed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_order_stuck_reset() {}
