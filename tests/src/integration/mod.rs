//! Cross-subsystem integration: real services over real store backends.

pub mod support;

mod flows;
mod persistence;
