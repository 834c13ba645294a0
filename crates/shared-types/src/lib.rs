//! # Shared Types Crate
//!
//! Domain entities, lifecycle state machines, typed update patches, and the
//! retry/backoff helper shared by every Coronet subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every record that crosses the store is
//!   defined here.
//! - **Store-Only Communication**: the scheduler and the reconciliation
//!   monitor never call each other; they exchange state exclusively through
//!   these records.
//! - **Typed Ownership**: partial updates are expressed as per-component
//!   patch types, so each component can only write the fields it owns.

#![warn(missing_docs)]

pub mod backoff;
pub mod entities;
pub mod patch;
pub mod singleflight;
pub mod status;

pub use backoff::{retry, RetryPolicy};
pub use entities::*;
pub use patch::*;
pub use singleflight::FlightGuard;
pub use status::*;
