//! Domain logic for order reconciliation
//!
//! Pure classification of provider responses. No I/O here; the service
//! layer applies the effects.

pub mod classify;

pub use classify::{classify_outcome, classify_status, OrderOutcome, StatusClass};
