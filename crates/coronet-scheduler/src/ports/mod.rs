//! Ports module for the Competition Scheduler

pub mod outbound;

pub use outbound::{ChainSource, CompetitionStore, OrderGateway, TokenLauncher};
