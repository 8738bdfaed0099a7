//! Host-facing strategy wrapper.
//!
//! [`IntradayStrategy`] binds one [`TradeStateMachine`] to an order gateway
//! and a state observer. It executes the machine's order commands, logs the
//! events each step produces and notifies the observer after every
//! mutation. Lifecycle hooks follow the host's init/start/stop calls.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::config::StrategyConfig;
use crate::domain::error::{EngineError, InvariantViolation};
use crate::domain::retry::OrderCommand;
use crate::domain::state_machine::{EngineEvent, Fill, Step, TradeStateMachine};
use crate::domain::tick::TickSnapshot;
use crate::ports::observer_port::StateObserver;
use crate::ports::order_gateway::OrderGateway;

pub struct IntradayStrategy<G, O> {
    symbol: String,
    machine: TradeStateMachine,
    gateway: G,
    observer: O,
}

impl<G: OrderGateway, O: StateObserver> IntradayStrategy<G, O> {
    pub fn new(
        symbol: impl Into<String>,
        config: StrategyConfig,
        gateway: G,
        observer: O,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            symbol: symbol.into(),
            machine: TradeStateMachine::new(config)?,
            gateway,
            observer,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn machine(&self) -> &TradeStateMachine {
        &self.machine
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn on_init(&mut self) {
        info!(symbol = %self.symbol, "strategy init");
        self.restart();
    }

    pub fn on_start(&mut self) {
        info!(symbol = %self.symbol, "strategy start");
        self.restart();
    }

    pub fn on_stop(&mut self) {
        let snapshot = self.machine.snapshot();
        info!(
            symbol = %self.symbol,
            phase = %snapshot.phase,
            position = snapshot.position.size,
            realized_pnl = snapshot.position.realized_pnl,
            rounds = snapshot.rounds,
            "strategy stop"
        );
    }

    pub fn on_tick(&mut self, tick: Arc<TickSnapshot>) -> Result<Step, EngineError> {
        let result = self.machine.on_tick(tick);
        self.finish(result)
    }

    pub fn on_trade(&mut self, fill: &Fill) -> Result<Step, EngineError> {
        debug!(
            symbol = %self.symbol,
            price = fill.price,
            quantity = fill.quantity,
            order_seq = fill.order_seq,
            "fill"
        );
        let result = self.machine.on_trade(fill);
        self.finish(result)
    }

    /// Operator resume after an invariant violation.
    pub fn resume(&mut self) -> Option<InvariantViolation> {
        let cleared = self.machine.resume();
        if let Some(violation) = &cleared {
            warn!(symbol = %self.symbol, %violation, "resumed by operator");
            self.observer.notify(&self.machine.snapshot());
        }
        cleared
    }

    /// The host has reconciled a position carried across a session boundary.
    pub fn acknowledge_carried_position(&mut self) -> Option<i64> {
        let carried = self.machine.acknowledge_carried_position();
        if let Some(position) = carried {
            info!(symbol = %self.symbol, position, "carried position acknowledged");
            self.observer.notify(&self.machine.snapshot());
        }
        carried
    }

    fn restart(&mut self) {
        self.gateway.cancel_all();
        self.machine.reset();
        self.observer.notify(&self.machine.snapshot());
    }

    fn finish(&mut self, result: Result<Step, EngineError>) -> Result<Step, EngineError> {
        match result {
            Ok(step) => {
                if let Some(command) = &step.command {
                    self.execute(command);
                }
                for event in &step.events {
                    self.log_event(event);
                }
                self.observer.notify(&self.machine.snapshot());
                Ok(step)
            }
            Err(err) => {
                if let EngineError::Invariant(_) = &err {
                    error!(symbol = %self.symbol, error = %err, "state machine halted");
                    self.observer.notify(&self.machine.snapshot());
                } else {
                    debug!(symbol = %self.symbol, error = %err, "event rejected");
                }
                Err(err)
            }
        }
    }

    fn execute(&mut self, command: &OrderCommand) {
        self.gateway.cancel_all();
        if let OrderCommand::Replace(intent) = command {
            self.gateway.submit(intent);
        }
    }

    fn log_event(&self, event: &EngineEvent) {
        let symbol = self.symbol.as_str();
        match event {
            EngineEvent::PhaseChanged { from, to, memo } => {
                info!(symbol, %from, %to, memo = %memo, "phase change");
            }
            EngineEvent::OrderIssued(intent) => {
                info!(
                    symbol,
                    side = %intent.side,
                    price = intent.price,
                    quantity = intent.quantity,
                    attempt = intent.attempt,
                    order_seq = intent.order_seq,
                    memo = %intent.memo,
                    "order issued"
                );
            }
            EngineEvent::SessionReset {
                previous_day,
                trading_day,
            } => {
                info!(symbol, %previous_day, %trading_day, "session reset");
            }
            EngineEvent::SessionAnomaly {
                prior_position,
                prior_phase,
                entry_price,
            } => {
                warn!(
                    symbol,
                    prior_position,
                    %prior_phase,
                    entry_price,
                    "position carried across session boundary; host must reconcile"
                );
            }
            EngineEvent::GateSuspended {
                realized_pnl,
                session_peak_pnl,
            } => {
                warn!(symbol, realized_pnl, session_peak_pnl, "entries suspended");
            }
            EngineEvent::GateResumed => {
                info!(symbol, "entries resumed");
            }
            EngineEvent::RoundClosed(round) => {
                info!(
                    symbol,
                    open_price = round.open_price,
                    close_price = round.close_price,
                    quantity = round.quantity,
                    pnl = round.pnl,
                    "round closed"
                );
            }
        }
    }
}
