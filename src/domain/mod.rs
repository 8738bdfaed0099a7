//! Core domain types and decision logic.

pub mod tick;
pub mod window;
pub mod condition;
pub mod phase;
pub mod position;
pub mod retry;
pub mod session;
pub mod state_machine;
pub mod config;
pub mod config_validation;
pub mod error;
