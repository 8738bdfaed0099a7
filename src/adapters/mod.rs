//! Concrete adapter implementations for ports.

pub mod csv_tick_adapter;
pub mod file_config_adapter;
pub mod log_observer;
pub mod paper_gateway;
