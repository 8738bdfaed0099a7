//! Domain error types.

use chrono::NaiveDateTime;

use super::phase::TradePhase;

/// A broken programming invariant. Fatal to the instrument's state machine:
/// once raised, no further order intents are emitted until an operator
/// resumes the machine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("fill of {quantity} @ {price} received while phase is {phase}")]
    UnexpectedFill {
        phase: TradePhase,
        price: f64,
        quantity: i64,
    },

    #[error("fill of {quantity} does not fit remaining quantity {remaining} in phase {phase}")]
    Overfill {
        phase: TradePhase,
        quantity: i64,
        remaining: i64,
    },

    #[error("fill references order #{order_seq} but only #{latest} was issued")]
    UnknownIntent { order_seq: u64, latest: u64 },

    #[error("fill references order #{order_seq}, issued before the current {phase} order #{first_seq}")]
    StaleIntent {
        order_seq: u64,
        first_seq: u64,
        phase: TradePhase,
    },

    #[error("negative volume in tick at {timestamp}")]
    NegativeVolume { timestamp: NaiveDateTime },

    #[error("tick at {timestamp} precedes previous tick at {previous}")]
    NonMonotonicTimestamp {
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },
}

/// Top-level error type for ticktrader.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("tick data error: {reason}")]
    TickData { reason: String },

    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("state machine halted after invariant violation: {0}")]
    Halted(InvariantViolation),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EngineError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. } => 2,
            EngineError::TickData { .. } => 3,
            EngineError::Invariant(_) | EngineError::Halted(_) => 4,
        }
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
