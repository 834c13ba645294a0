//! Port definitions for the Order Reconciliation Monitor

pub mod outbound;

pub use outbound::{OrderFile, OrderStatusGateway, OrderStatusSnapshot, ReconcileStore};
