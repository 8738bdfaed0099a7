//! Observer adapters.

use crate::domain::state_machine::StateSnapshot;
use crate::ports::observer_port::StateObserver;

/// Logs every snapshot at debug level.
#[derive(Debug, Default)]
pub struct LogObserver {
    notifications: u64,
}

impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> u64 {
        self.notifications
    }
}

impl StateObserver for LogObserver {
    fn notify(&mut self, snapshot: &StateSnapshot) {
        self.notifications += 1;
        tracing::debug!(
            phase = %snapshot.phase,
            position = snapshot.position.size,
            entry_price = snapshot.position.entry_price,
            realized_pnl = snapshot.position.realized_pnl,
            attempt = snapshot.attempt,
            unfilled_ticks = snapshot.unfilled_ticks,
            entries_enabled = snapshot.entries_enabled,
            halted = snapshot.halted,
            memo = %snapshot.memo,
            "state"
        );
    }
}

/// Discards notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StateObserver for NullObserver {
    fn notify(&mut self, _snapshot: &StateSnapshot) {}
}
