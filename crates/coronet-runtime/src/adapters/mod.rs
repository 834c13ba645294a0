//! Concrete adapters behind the core ports.
//!
//! Each module satisfies one outbound port with a real implementation:
//! esplora for block heights, the order desk HTTP API for order creation and
//! polling, a webhook for the secondary launch trigger, and two store
//! backends.

pub mod chain;
pub mod launch;
pub mod provider;
pub mod store;
