//! Order retry controller.
//!
//! Tracks the single working order of the current phase. Non-fills are
//! counted in ticks, never wall-clock time: once the unfilled count exceeds
//! the phase threshold the order is cancelled and reissued one attempt
//! higher at the phase's retry offset. Every reissue supersedes the previous
//! intent, so at most one intent is outstanding at any instant.

use super::config::RetryConfig;
use super::phase::{OrderSide, TradePhase};
use super::tick::TickSnapshot;

/// An order the host gateway should place. Consumed immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrderIntent {
    pub side: OrderSide,
    pub price: f64,
    pub quantity: i64,
    pub memo: String,
    /// Attempt within the current phase, starting at 1.
    pub attempt: u32,
    /// Machine-wide order sequence number, strictly increasing.
    pub order_seq: u64,
    pub phase: TradePhase,
}

/// Instruction for the host gateway. There is no partial cancel: a new
/// intent always supersedes whatever was working for the instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderCommand {
    /// Cancel everything working for the instrument.
    CancelAll,
    /// Cancel everything working, then submit the intent.
    Replace(PendingOrderIntent),
}

impl OrderCommand {
    pub fn intent(&self) -> Option<&PendingOrderIntent> {
        match self {
            OrderCommand::CancelAll => None,
            OrderCommand::Replace(intent) => Some(intent),
        }
    }
}

#[derive(Debug, Clone)]
struct WorkingOrder {
    /// Sequence number of attempt 1 in this phase.
    first_seq: u64,
    unfilled_ticks: u32,
    memo_base: String,
    intent: PendingOrderIntent,
}

#[derive(Debug, Clone)]
pub struct OrderRetryController {
    config: RetryConfig,
    price_tick: f64,
    working: Option<WorkingOrder>,
    order_seq: u64,
}

impl OrderRetryController {
    pub fn new(config: RetryConfig, price_tick: f64) -> Self {
        OrderRetryController {
            config,
            price_tick,
            working: None,
            order_seq: 0,
        }
    }

    /// Sequence number of the most recently issued intent, 0 if none.
    pub fn latest_seq(&self) -> u64 {
        self.order_seq
    }

    pub fn outstanding(&self) -> Option<&PendingOrderIntent> {
        self.working.as_ref().map(|w| &w.intent)
    }

    /// Oldest order sequence the current phase issued. Fills for anything
    /// older belong to a superseded phase or session.
    pub fn phase_first_seq(&self) -> Option<u64> {
        self.working.as_ref().map(|w| w.first_seq)
    }

    pub fn unfilled_ticks(&self) -> u32 {
        self.working.as_ref().map_or(0, |w| w.unfilled_ticks)
    }

    pub fn attempt(&self) -> u32 {
        self.working.as_ref().map_or(0, |w| w.intent.attempt)
    }

    /// Start working a new phase: reset the counters and issue attempt 1.
    /// `wide_first` selects the first-attempt offset; otherwise the retry
    /// offset is used from the start.
    pub fn on_phase_entered(
        &mut self,
        phase: TradePhase,
        tick: &TickSnapshot,
        quantity: i64,
        memo_base: String,
        wide_first: bool,
    ) -> Option<OrderCommand> {
        let side = phase.order_side()?;
        let offset = self.config.offset(phase);
        let ticks = if wide_first { offset.first } else { offset.retry };
        let intent = self.issue(phase, side, tick, ticks, quantity, &memo_base, 1);
        self.working = Some(WorkingOrder {
            first_seq: intent.order_seq,
            unfilled_ticks: 0,
            memo_base,
            intent: intent.clone(),
        });
        Some(OrderCommand::Replace(intent))
    }

    /// Count a tick on which the working order did not fill. Returns a
    /// cancel-and-resubmit command once the phase threshold is exceeded.
    pub fn on_tick_without_fill(
        &mut self,
        phase: TradePhase,
        tick: &TickSnapshot,
    ) -> Option<OrderCommand> {
        let threshold = self.config.threshold(phase);
        let offset = self.config.offset(phase).retry;
        let working = self.working.as_mut()?;
        if working.intent.phase != phase {
            return None;
        }
        working.unfilled_ticks += 1;
        if working.unfilled_ticks <= threshold {
            return None;
        }

        let attempt = working.intent.attempt + 1;
        let quantity = working.intent.quantity;
        let side = working.intent.side;
        let memo_base = working.memo_base.clone();
        let intent = self.issue(phase, side, tick, offset, quantity, &memo_base, attempt);
        if let Some(working) = self.working.as_mut() {
            working.unfilled_ticks = 0;
            working.intent = intent.clone();
        }
        Some(OrderCommand::Replace(intent))
    }

    /// A partial fill: shrink the working quantity and restart the
    /// unfilled count. The attempt number is kept.
    pub fn on_partial_fill(&mut self, filled: i64) {
        if let Some(working) = self.working.as_mut() {
            working.intent.quantity = (working.intent.quantity - filled).max(0);
            working.unfilled_ticks = 0;
        }
    }

    /// The phase's order is complete; nothing is working any more.
    pub fn on_filled(&mut self, phase: TradePhase) {
        if self
            .working
            .as_ref()
            .is_some_and(|w| w.intent.phase == phase)
        {
            self.working = None;
        }
    }

    /// Forget the working order. The sequence counter keeps running so
    /// late fills of superseded orders remain identifiable.
    pub fn reset(&mut self) {
        self.working = None;
    }

    #[allow(clippy::too_many_arguments)]
    fn issue(
        &mut self,
        phase: TradePhase,
        side: OrderSide,
        tick: &TickSnapshot,
        offset_ticks: u32,
        quantity: i64,
        memo_base: &str,
        attempt: u32,
    ) -> PendingOrderIntent {
        self.order_seq += 1;
        let adjust = self.price_tick * offset_ticks as f64;
        let price = match side {
            OrderSide::OpenShort => tick.best_ask() - adjust,
            OrderSide::CoverShort => tick.best_bid() + adjust,
        };
        PendingOrderIntent {
            side,
            price,
            quantity,
            memo: format!("{memo_base}-#{}", self.order_seq),
            attempt,
            order_seq: self.order_seq,
            phase,
        }
    }
}
