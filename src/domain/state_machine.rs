//! Per-instrument trade state machine.
//!
//! Consumes ticks and fill confirmations one at a time and runs each to
//! completion. Every step returns a [`Step`]: at most one order command for
//! the host gateway plus the structured events the step produced. The
//! machine itself performs no I/O and never logs; the host decides what to
//! do with the events.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use super::condition::{self, Condition};
use super::config::StrategyConfig;
use super::error::{EngineError, InvariantViolation};
use super::phase::TradePhase;
use super::position::{ClosedRound, PositionState};
use super::retry::{OrderCommand, OrderRetryController, PendingOrderIntent};
use super::session::{SessionResetDetector, calendar_for};
use super::tick::TickSnapshot;
use super::window::RollingWindow;

/// Fill confirmation delivered by the host gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub price: f64,
    pub quantity: i64,
    /// Sequence number of the intent this fill satisfies.
    pub order_seq: u64,
    pub timestamp: NaiveDateTime,
}

/// Something the host should know about. Never blocks the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PhaseChanged {
        from: TradePhase,
        to: TradePhase,
        memo: String,
    },
    OrderIssued(PendingOrderIntent),
    SessionReset {
        previous_day: NaiveDate,
        trading_day: NaiveDate,
    },
    /// A non-flat position was open when the session rolled over.
    SessionAnomaly {
        prior_position: i64,
        prior_phase: TradePhase,
        entry_price: f64,
    },
    GateSuspended {
        realized_pnl: f64,
        session_peak_pnl: f64,
    },
    GateResumed,
    RoundClosed(ClosedRound),
}

/// Result of one tick or fill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub command: Option<OrderCommand>,
    pub events: Vec<EngineEvent>,
}

impl Step {
    pub fn is_empty(&self) -> bool {
        self.command.is_none() && self.events.is_empty()
    }
}

/// Read-only view of the machine handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub phase: TradePhase,
    pub position: PositionState,
    pub entries_enabled: bool,
    pub carried_position: Option<i64>,
    pub halted: bool,
    pub attempt: u32,
    pub unfilled_ticks: u32,
    pub order_seq: u64,
    pub memo: String,
    pub session_low: Option<f64>,
    pub last_tick: Option<NaiveDateTime>,
    pub rounds: usize,
}

#[derive(Debug)]
pub struct TradeStateMachine {
    config: StrategyConfig,
    phase: TradePhase,
    position: PositionState,
    entry_window: RollingWindow,
    wave_window: RollingWindow,
    detector: SessionResetDetector,
    retry: OrderRetryController,
    /// Entry gate. Suspended after a losing stretch, independent of phase.
    entries_enabled: bool,
    carried_position: Option<i64>,
    halted: Option<InvariantViolation>,
    last_timestamp: Option<NaiveDateTime>,
    session_low: Option<f64>,
    memo: String,
    open_memo: String,
    /// Quantity still to fill in the current order phase.
    remaining: i64,
    lot_quantity: i64,
    cover_value: f64,
    cover_pnl: f64,
    rounds: Vec<ClosedRound>,
}

impl TradeStateMachine {
    /// Build a machine from a config that has passed validation.
    pub fn new(config: StrategyConfig) -> Result<Self, EngineError> {
        super::config_validation::validate_strategy_config(&config)?;
        Ok(TradeStateMachine {
            phase: TradePhase::Idle,
            position: PositionState::default(),
            entry_window: RollingWindow::time_bounded(config.entry_window_span()),
            wave_window: RollingWindow::count_bounded(config.wave_window_ticks),
            detector: SessionResetDetector::new(calendar_for(config.night_rollover_hour)),
            retry: OrderRetryController::new(config.retry.clone(), config.price_tick),
            entries_enabled: true,
            carried_position: None,
            halted: None,
            last_timestamp: None,
            session_low: None,
            memo: String::new(),
            open_memo: String::new(),
            remaining: 0,
            lot_quantity: 0,
            cover_value: 0.0,
            cover_pnl: 0.0,
            rounds: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn phase(&self) -> TradePhase {
        self.phase
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    pub fn entry_window(&self) -> &RollingWindow {
        &self.entry_window
    }

    pub fn wave_window(&self) -> &RollingWindow {
        &self.wave_window
    }

    pub fn entries_enabled(&self) -> bool {
        self.entries_enabled
    }

    pub fn carried_position(&self) -> Option<i64> {
        self.carried_position
    }

    pub fn halted(&self) -> Option<&InvariantViolation> {
        self.halted.as_ref()
    }

    pub fn outstanding(&self) -> Option<&PendingOrderIntent> {
        self.retry.outstanding()
    }

    pub fn rounds(&self) -> &[ClosedRound] {
        &self.rounds
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            phase: self.phase,
            position: self.position.clone(),
            entries_enabled: self.entries_enabled,
            carried_position: self.carried_position,
            halted: self.halted.is_some(),
            attempt: self.retry.attempt(),
            unfilled_ticks: self.retry.unfilled_ticks(),
            order_seq: self.retry.latest_seq(),
            memo: self.memo.clone(),
            session_low: self.session_low,
            last_tick: self.last_timestamp,
            rounds: self.rounds.len(),
        }
    }

    /// Return to the freshly constructed state. The closed-round ledger and
    /// the order sequence start over as well.
    pub fn reset(&mut self) {
        self.retry = OrderRetryController::new(self.config.retry.clone(), self.config.price_tick);
        self.clear_session();
        self.position = PositionState::default();
        self.carried_position = None;
        self.halted = None;
        self.last_timestamp = None;
        self.rounds.clear();
    }

    /// Operator intervention after an invariant violation. Trading state is
    /// left as it was when the machine froze.
    pub fn resume(&mut self) -> Option<InvariantViolation> {
        self.halted.take()
    }

    /// The host has reconciled the position carried across a session
    /// boundary; new entries may resume.
    pub fn acknowledge_carried_position(&mut self) -> Option<i64> {
        self.carried_position.take()
    }

    pub fn on_tick(&mut self, tick: Arc<TickSnapshot>) -> Result<Step, EngineError> {
        self.ensure_running()?;
        if let Err(violation) = self.check_tick(&tick) {
            return Err(self.halt(violation));
        }
        self.last_timestamp = Some(tick.timestamp);

        let mut step = Step::default();
        if !self.config.accepts(tick.timestamp) {
            return Ok(step);
        }

        if self
            .detector
            .crosses_boundary(&self.entry_window, tick.timestamp)
        {
            self.session_reset(&tick, &mut step);
            return Ok(step);
        }

        self.entry_window.push(Arc::clone(&tick));
        self.wave_window.push(Arc::clone(&tick));
        self.session_low = Some(match self.session_low {
            Some(low) => low.min(tick.last_price),
            None => tick.last_price,
        });

        match self.phase {
            TradePhase::Idle => self.evaluate_entry(&tick, &mut step),
            TradePhase::Positioned => self.evaluate_exit(&tick, &mut step),
            TradePhase::Opening
            | TradePhase::StoppingLoss
            | TradePhase::StoppingProfitA
            | TradePhase::StoppingProfitB => {
                if let Some(command) = self.retry.on_tick_without_fill(self.phase, &tick) {
                    self.issue(command, &mut step);
                }
            }
        }
        Ok(step)
    }

    pub fn on_trade(&mut self, fill: &Fill) -> Result<Step, EngineError> {
        self.ensure_running()?;
        if let Err(violation) = self.check_fill(fill) {
            return Err(self.halt(violation));
        }

        let mut step = Step::default();
        match self.phase {
            TradePhase::Opening => self.apply_open_fill(fill, &mut step),
            TradePhase::StoppingLoss | TradePhase::StoppingProfitA | TradePhase::StoppingProfitB => {
                self.apply_cover_fill(fill, &mut step)
            }
            // Rejected by check_fill.
            TradePhase::Idle | TradePhase::Positioned => {}
        }
        Ok(step)
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        match &self.halted {
            Some(violation) => Err(EngineError::Halted(violation.clone())),
            None => Ok(()),
        }
    }

    fn halt(&mut self, violation: InvariantViolation) -> EngineError {
        self.halted = Some(violation.clone());
        EngineError::Invariant(violation)
    }

    fn check_tick(&self, tick: &TickSnapshot) -> Result<(), InvariantViolation> {
        tick.validate()?;
        match self.last_timestamp {
            Some(previous) if tick.timestamp < previous => {
                Err(InvariantViolation::NonMonotonicTimestamp {
                    timestamp: tick.timestamp,
                    previous,
                })
            }
            _ => Ok(()),
        }
    }

    fn check_fill(&self, fill: &Fill) -> Result<(), InvariantViolation> {
        let latest = self.retry.latest_seq();
        if fill.order_seq == 0 || fill.order_seq > latest {
            return Err(InvariantViolation::UnknownIntent {
                order_seq: fill.order_seq,
                latest,
            });
        }
        if !self.phase.has_pending_order() {
            return Err(InvariantViolation::UnexpectedFill {
                phase: self.phase,
                price: fill.price,
                quantity: fill.quantity,
            });
        }
        if let Some(first_seq) = self.retry.phase_first_seq()
            && fill.order_seq < first_seq
        {
            return Err(InvariantViolation::StaleIntent {
                order_seq: fill.order_seq,
                first_seq,
                phase: self.phase,
            });
        }
        if fill.quantity <= 0 || fill.quantity > self.remaining {
            return Err(InvariantViolation::Overfill {
                phase: self.phase,
                quantity: fill.quantity,
                remaining: self.remaining,
            });
        }
        Ok(())
    }

    fn evaluate_entry(&mut self, tick: &TickSnapshot, step: &mut Step) {
        if self.carried_position.is_some() {
            return;
        }
        if !self.entries_enabled {
            if condition::within_band(&self.entry_window, self.config.breakout_pct) {
                self.entries_enabled = true;
                step.events.push(EngineEvent::GateResumed);
            }
            return;
        }
        if self.position.is_short() {
            return;
        }
        if !condition::breakout(&self.entry_window, self.config.breakout_pct) {
            return;
        }

        let mut fired = vec![Condition::Breakout];
        if condition::ask_dominance(tick, self.config.open_imbalance_ratio) {
            fired.push(Condition::AskDominance);
        }
        if condition::large_ask_volume(tick, self.config.open_ask_volume_threshold) {
            fired.push(Condition::LargeAskVolume);
        }
        if fired.len() == 1 {
            return;
        }

        let near_low = self
            .session_low
            .is_some_and(|low| tick.last_price - low <= self.config.open_near_low_points);
        self.enter_order_phase(TradePhase::Opening, tick, &fired, near_low, step);
    }

    fn evaluate_exit(&mut self, tick: &TickSnapshot, step: &mut Step) {
        self.position.observe(tick.last_price);
        let profit = self.position.open_profit(tick.last_price);

        if profit < 0.0 {
            if self.position.adverse_ticks > self.config.stop_loss_adverse_ticks {
                self.enter_order_phase(
                    TradePhase::StoppingLoss,
                    tick,
                    &[Condition::AdverseTicks],
                    true,
                    step,
                );
            }
            return;
        }

        let mut strong = Vec::new();
        if profit >= self.config.profit_a_points
            && condition::drawdown_from_peak(
                profit,
                self.position.peak_profit,
                self.config.profit_retrace_ratio,
            )
        {
            strong.push(Condition::ProfitRetrace);
        }
        if condition::bid_dominance(
            tick,
            self.config.cover_imbalance_ratio,
            self.config.cover_min_bid_volume,
        ) {
            strong.push(Condition::BidDominance);
        }
        if !strong.is_empty() {
            self.enter_order_phase(TradePhase::StoppingProfitA, tick, &strong, true, step);
            return;
        }

        if profit > self.config.profit_b_points
            && condition::range_compressed(&self.wave_window, self.config.wave_epsilon)
        {
            self.enter_order_phase(
                TradePhase::StoppingProfitB,
                tick,
                &[Condition::RangeCompression],
                true,
                step,
            );
        }
    }

    fn enter_order_phase(
        &mut self,
        to: TradePhase,
        tick: &TickSnapshot,
        fired: &[Condition],
        wide_first: bool,
        step: &mut Step,
    ) {
        let quantity = match to {
            TradePhase::Opening => self.config.volume,
            _ => self.position.size.abs(),
        };
        let mut memo_base = format!("{}{}", self.position.size, to.memo_tag());
        for marker in fired.iter().map(|c| c.marker()) {
            memo_base.push('-');
            memo_base.push_str(marker);
        }

        let Some(command) = self
            .retry
            .on_phase_entered(to, tick, quantity, memo_base, wide_first)
        else {
            return;
        };
        self.remaining = quantity;
        if to.is_closing() {
            self.lot_quantity = quantity;
            self.cover_value = 0.0;
            self.cover_pnl = 0.0;
        }
        let from = self.phase;
        self.phase = to;
        if let Some(intent) = command.intent() {
            self.memo = intent.memo.clone();
        }
        step.events.push(EngineEvent::PhaseChanged {
            from,
            to,
            memo: self.memo.clone(),
        });
        self.issue(command, step);
    }

    fn issue(&mut self, command: OrderCommand, step: &mut Step) {
        if let Some(intent) = command.intent() {
            self.memo = intent.memo.clone();
            step.events.push(EngineEvent::OrderIssued(intent.clone()));
        }
        step.command = Some(command);
    }

    fn apply_open_fill(&mut self, fill: &Fill, step: &mut Step) {
        self.position.add_short(fill.price, fill.quantity, fill.timestamp);
        self.remaining -= fill.quantity;
        if self.remaining > 0 {
            self.retry.on_partial_fill(fill.quantity);
            return;
        }

        self.retry.on_filled(TradePhase::Opening);
        self.position.start_lot();
        self.open_memo = self.memo.clone();
        self.transition(TradePhase::Positioned, step);
    }

    fn apply_cover_fill(&mut self, fill: &Fill, step: &mut Step) {
        let open_time = self.position.entry_time.unwrap_or(fill.timestamp);
        let open_price = self.position.entry_price;

        let pnl = self.position.cover_short(fill.price, fill.quantity);
        self.cover_value += fill.price * fill.quantity as f64;
        self.cover_pnl += pnl;
        self.remaining -= fill.quantity;
        if self.remaining > 0 {
            self.retry.on_partial_fill(fill.quantity);
            return;
        }

        let phase = self.phase;
        self.retry.on_filled(phase);
        let round = ClosedRound {
            open_time,
            open_price,
            close_time: fill.timestamp,
            close_price: self.cover_value / self.lot_quantity as f64,
            quantity: -self.lot_quantity,
            pnl: self.cover_pnl,
            open_memo: std::mem::take(&mut self.open_memo),
            close_memo: self.memo.clone(),
        };
        self.rounds.push(round.clone());
        step.events.push(EngineEvent::RoundClosed(round));
        self.transition(TradePhase::Idle, step);
        self.check_entry_gate(step);
    }

    /// Suspend entries after giving back too much of the session's peak, or
    /// after breaching the session loss floor.
    fn check_entry_gate(&mut self, step: &mut Step) {
        if !self.entries_enabled || !self.position.is_flat() {
            return;
        }
        let realized = self.position.realized_pnl;
        let peak = self.position.session_peak_pnl;
        let gave_back =
            realized > 0.0 && realized < peak * self.config.session_drawdown_ratio;
        let floor_breached = realized < -self.config.max_session_loss;
        if gave_back || floor_breached {
            self.entries_enabled = false;
            step.events.push(EngineEvent::GateSuspended {
                realized_pnl: realized,
                session_peak_pnl: peak,
            });
        }
    }

    fn transition(&mut self, to: TradePhase, step: &mut Step) {
        let from = self.phase;
        self.phase = to;
        step.events.push(EngineEvent::PhaseChanged {
            from,
            to,
            memo: self.memo.clone(),
        });
    }

    fn session_reset(&mut self, tick: &TickSnapshot, step: &mut Step) {
        let previous_day = self
            .entry_window
            .oldest()
            .map(|t| self.detector.trading_day(t.timestamp))
            .unwrap_or_else(|| self.detector.trading_day(tick.timestamp));
        step.events.push(EngineEvent::SessionReset {
            previous_day,
            trading_day: self.detector.trading_day(tick.timestamp),
        });

        if !self.position.is_flat() {
            step.events.push(EngineEvent::SessionAnomaly {
                prior_position: self.position.size,
                prior_phase: self.phase,
                entry_price: self.position.entry_price,
            });
            self.carried_position = Some(self.position.size);
        }
        if self.phase.has_pending_order() {
            step.command = Some(OrderCommand::CancelAll);
        }
        if self.phase != TradePhase::Idle {
            self.transition(TradePhase::Idle, step);
        }

        self.clear_session();
        self.position = PositionState::default();
    }

    /// Clear everything scoped to one trading session.
    fn clear_session(&mut self) {
        self.phase = TradePhase::Idle;
        self.entry_window.clear();
        self.wave_window.clear();
        self.retry.reset();
        self.entries_enabled = true;
        self.session_low = None;
        self.memo.clear();
        self.open_memo.clear();
        self.remaining = 0;
        self.lot_quantity = 0;
        self.cover_value = 0.0;
        self.cover_pnl = 0.0;
    }
}
