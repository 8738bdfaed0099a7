//! Deterministic replay of recorded ticks through a paper gateway.

use std::sync::Arc;

use tracing::info;

use crate::adapters::log_observer::LogObserver;
use crate::adapters::paper_gateway::PaperGateway;
use crate::domain::config::StrategyConfig;
use crate::domain::error::EngineError;
use crate::domain::phase::TradePhase;
use crate::domain::position::ClosedRound;
use crate::domain::state_machine::EngineEvent;
use crate::domain::tick::TickSnapshot;
use crate::ports::config_port::ConfigPort;
use crate::strategy::IntradayStrategy;

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOptions {
    pub symbol: String,
    /// Reconcile positions carried across a session boundary automatically,
    /// so the next session can trade.
    pub auto_acknowledge: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        ReplayOptions {
            symbol: "replay".to_string(),
            auto_acknowledge: true,
        }
    }
}

impl ReplayOptions {
    /// Read `[replay]`. The CLI's `--symbol` takes precedence over `symbol`.
    pub fn from_config(port: &dyn ConfigPort, symbol: Option<&str>) -> Result<Self, EngineError> {
        let symbol = match symbol {
            Some(s) => s.to_string(),
            None => port.require_string("replay", "symbol")?,
        };
        Ok(ReplayOptions {
            symbol,
            auto_acknowledge: port.get_bool("replay", "auto_acknowledge", true),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayResult {
    pub symbol: String,
    pub ticks: usize,
    pub rounds: Vec<ClosedRound>,
    /// Sum of round P&L across every session replayed.
    pub realized_pnl: f64,
    pub anomalies: usize,
    pub events: usize,
    pub orders: usize,
    pub fills: usize,
    pub final_phase: TradePhase,
}

impl ReplayResult {
    pub fn winning_rounds(&self) -> usize {
        self.rounds.iter().filter(|r| r.pnl > 0.0).count()
    }
}

pub fn run_replay(ticks: Vec<TickSnapshot>, config: StrategyConfig) -> Result<ReplayResult, EngineError> {
    run_replay_with(ticks, config, &ReplayOptions::default())
}

/// Feed every tick through an [`IntradayStrategy`] backed by a
/// [`PaperGateway`]. A working order is matched against each new tick
/// before the strategy sees it, so fills always arrive on a later tick than
/// the submission.
pub fn run_replay_with(
    ticks: Vec<TickSnapshot>,
    config: StrategyConfig,
    options: &ReplayOptions,
) -> Result<ReplayResult, EngineError> {
    let mut strategy = IntradayStrategy::new(
        options.symbol.clone(),
        config,
        PaperGateway::new(),
        LogObserver::new(),
    )?;
    strategy.on_init();
    strategy.on_start();

    let tick_count = ticks.len();
    let mut rounds = Vec::new();
    let mut anomalies = 0;
    let mut events = 0;
    let mut fills = 0;

    for tick in ticks {
        let tick = Arc::new(tick);
        let mut steps = Vec::with_capacity(2);

        if let Some(fill) = strategy.gateway_mut().match_tick(&tick) {
            fills += 1;
            steps.push(strategy.on_trade(&fill)?);
        }
        steps.push(strategy.on_tick(tick)?);

        for event in steps.iter().flat_map(|s| s.events.iter()) {
            events += 1;
            match event {
                EngineEvent::RoundClosed(round) => rounds.push(round.clone()),
                EngineEvent::SessionAnomaly { .. } => {
                    anomalies += 1;
                    if options.auto_acknowledge {
                        strategy.acknowledge_carried_position();
                    }
                }
                _ => {}
            }
        }
    }
    strategy.on_stop();

    let result = ReplayResult {
        symbol: options.symbol.clone(),
        ticks: tick_count,
        realized_pnl: rounds.iter().map(|r| r.pnl).sum(),
        rounds,
        anomalies,
        events,
        orders: strategy.gateway().submitted(),
        fills,
        final_phase: strategy.machine().phase(),
    };
    info!(
        symbol = %result.symbol,
        ticks = result.ticks,
        rounds = result.rounds.len(),
        realized_pnl = result.realized_pnl,
        anomalies = result.anomalies,
        "replay finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::tick::{BookLevel, DEPTH};
    use chrono::{Duration, NaiveDate};

    fn tick(secs: i64, last: f64, bid_vol: i64, ask_vol: i64) -> TickSnapshot {
        TickSnapshot {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(21, 0, 0)
                .unwrap()
                + Duration::seconds(secs),
            last_price: last,
            open_price: last,
            bids: [BookLevel::new(last - 1.0, bid_vol); DEPTH],
            asks: [BookLevel::new(last + 1.0, ask_vol); DEPTH],
        }
    }

    #[test]
    fn quiet_market_trades_nothing() {
        let ticks = (0..50).map(|i| tick(i, 100.0, 10, 10)).collect();
        let result = run_replay(ticks, StrategyConfig::default()).unwrap();
        assert_eq!(result.ticks, 50);
        assert!(result.rounds.is_empty());
        assert_eq!(result.orders, 0);
        assert_eq!(result.final_phase, TradePhase::Idle);
    }

    #[test]
    fn breakout_opens_and_fills_on_next_tick() {
        // Open-short limit = ask1 104 - 5 = 99, marketable once bid1 >= 99.
        let ticks = vec![
            tick(0, 100.0, 10, 10),
            tick(1, 103.0, 10, 40),
            tick(2, 103.0, 10, 10),
        ];
        let result = run_replay(ticks, StrategyConfig::default()).unwrap();
        assert_eq!(result.orders, 1);
        assert_eq!(result.fills, 1);
        assert_eq!(result.final_phase, TradePhase::Positioned);
    }

    #[test]
    fn options_prefer_cli_symbol() {
        let port = FileConfigAdapter::from_string("[replay]\nsymbol = rb2405\n").unwrap();
        let from_config = ReplayOptions::from_config(&port, None).unwrap();
        assert_eq!(from_config.symbol, "rb2405");
        assert!(from_config.auto_acknowledge);
        let from_cli = ReplayOptions::from_config(&port, Some("hc2405")).unwrap();
        assert_eq!(from_cli.symbol, "hc2405");
    }

    #[test]
    fn options_without_symbol_is_missing_key() {
        let port = FileConfigAdapter::from_string("[replay]\nauto_acknowledge = no\n").unwrap();
        assert!(matches!(
            ReplayOptions::from_config(&port, None),
            Err(EngineError::ConfigMissing { .. })
        ));
    }
}
