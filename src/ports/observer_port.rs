//! State observer port.

use crate::domain::state_machine::StateSnapshot;

/// Called after every state mutation so the host can refresh displays.
/// Must not block and cannot fail the engine.
pub trait StateObserver {
    fn notify(&mut self, snapshot: &StateSnapshot);
}
