//! Host-facing port traits.

pub mod config_port;
pub mod observer_port;
pub mod order_gateway;
pub mod tick_source;
