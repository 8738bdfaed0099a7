//! Simulated order gateway for replaying recorded ticks.

use crate::domain::phase::OrderSide;
use crate::domain::retry::PendingOrderIntent;
use crate::domain::state_machine::Fill;
use crate::domain::tick::TickSnapshot;
use crate::ports::order_gateway::OrderGateway;

/// Keeps the single working intent and fills it in full, at its limit
/// price, on the first later tick where it is marketable: a sell when the
/// limit is at or below the best bid, a buy when it is at or above the best
/// ask.
#[derive(Debug, Default)]
pub struct PaperGateway {
    working: Option<PendingOrderIntent>,
    submitted: usize,
    cancels: usize,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn working(&self) -> Option<&PendingOrderIntent> {
        self.working.as_ref()
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    pub fn cancels(&self) -> usize {
        self.cancels
    }

    /// Try to fill the working intent against `tick`.
    pub fn match_tick(&mut self, tick: &TickSnapshot) -> Option<Fill> {
        let intent = self.working.as_ref()?;
        let marketable = match intent.side {
            OrderSide::OpenShort => intent.price <= tick.best_bid(),
            OrderSide::CoverShort => intent.price >= tick.best_ask(),
        };
        if !marketable || intent.quantity <= 0 {
            return None;
        }
        let intent = self.working.take()?;
        Some(Fill {
            price: intent.price,
            quantity: intent.quantity,
            order_seq: intent.order_seq,
            timestamp: tick.timestamp,
        })
    }
}

impl OrderGateway for PaperGateway {
    fn submit(&mut self, intent: &PendingOrderIntent) {
        self.submitted += 1;
        self.working = Some(intent.clone());
    }

    fn cancel_all(&mut self) {
        if self.working.take().is_some() {
            self.cancels += 1;
        }
    }
}
