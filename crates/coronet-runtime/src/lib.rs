//! # Coronet Runtime Library
//!
//! Everything around the two core services: configuration, concrete adapters
//! for the external collaborators, the persistent store backends, the ingress
//! HTTP API, and the supervisor that wires it all together. The `coronetd`
//! binary in `main.rs` is a thin shell over this library.
//!
//! ## Architectural Patterns
//!
//! - **Hexagonal**: the core crates define outbound port traits; this crate
//!   implements them and owns every I/O concern
//! - **Store-Only Communication**: the scheduler and the monitor share one
//!   store object and nothing else
//! - **Explicit Wiring**: services are constructed once by the supervisor at
//!   process start; no globals, no ambient state

pub mod adapters;
pub mod api;
pub mod config;
pub mod ports;
pub mod supervisor;

pub use adapters::chain::EsploraChainSource;
pub use adapters::launch::{NoopLauncher, WebhookLauncher};
pub use adapters::provider::HttpOrderProvider;
pub use adapters::store::{MemoryStore, RocksConfig, RocksStore};
pub use config::{RuntimeConfig, StoreBackend};
pub use ports::{DirectoryError, ProposalDirectory, ProposalDraft, StatusCounts, StatusSummary};
pub use supervisor::Supervisor;
