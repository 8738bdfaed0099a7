//! ticktrader: tick-driven intraday trading decision engine.
//!
//! Hexagonal architecture: the per-instrument decision core in [`domain`],
//! host-facing port traits in [`ports`], concrete implementations in
//! [`adapters`]. [`strategy`] binds the core to a gateway and observer;
//! [`replay`] drives it over recorded ticks.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod strategy;
pub mod replay;
pub mod logging;
pub mod cli;
