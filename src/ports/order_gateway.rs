//! Order gateway port.

use crate::domain::retry::PendingOrderIntent;

/// Where order intents go. Submission and cancellation are fire-and-forget:
/// fills come back later through the strategy's `on_trade`, never as a
/// return value.
pub trait OrderGateway {
    fn submit(&mut self, intent: &PendingOrderIntent);
    fn cancel_all(&mut self);
}
