//! # Coronet Test Suite
//!
//! Unified integration test crate. Unit tests live next to the code they
//! cover; everything here wires multiple subsystems together:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs     # Scripted chain / provider / launcher fixtures
//!     ├── flows.rs       # Full competition lifecycles over MemoryStore
//!     └── persistence.rs # Restart and resume semantics over RocksStore
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # Everything
//! cargo test -p coronet-tests
//!
//! # One area
//! cargo test -p coronet-tests integration::flows
//! cargo test -p coronet-tests integration::persistence
//! ```

pub mod integration;
