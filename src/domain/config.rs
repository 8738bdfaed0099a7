//! Strategy configuration.
//!
//! Every threshold the decision engine uses lives here under a name. Values
//! are read from a [`ConfigPort`] and validated once, at construction time;
//! tick processing never re-checks them.

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::domain::config_validation;
use crate::domain::error::EngineError;
use crate::domain::phase::TradePhase;
use crate::ports::config_port::ConfigPort;

/// Over-price offsets, in price ticks, for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverPrice {
    pub first: u32,
    pub retry: u32,
}

impl OverPrice {
    pub const fn new(first: u32, retry: u32) -> Self {
        OverPrice { first, retry }
    }
}

/// Tick-counted retry cadence and per-phase pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub open_threshold: u32,
    pub stop_loss_threshold: u32,
    pub stop_profit_threshold: u32,
    pub open_offset: OverPrice,
    pub stop_loss_offset: OverPrice,
    pub profit_a_offset: OverPrice,
    pub profit_b_offset: OverPrice,
}

impl RetryConfig {
    /// Unfilled ticks tolerated in `phase` before cancel-and-resubmit.
    pub fn threshold(&self, phase: TradePhase) -> u32 {
        match phase {
            TradePhase::Opening => self.open_threshold,
            TradePhase::StoppingLoss => self.stop_loss_threshold,
            TradePhase::StoppingProfitA | TradePhase::StoppingProfitB => {
                self.stop_profit_threshold
            }
            TradePhase::Idle | TradePhase::Positioned => 0,
        }
    }

    pub fn offset(&self, phase: TradePhase) -> OverPrice {
        match phase {
            TradePhase::Opening => self.open_offset,
            TradePhase::StoppingLoss => self.stop_loss_offset,
            TradePhase::StoppingProfitA => self.profit_a_offset,
            TradePhase::StoppingProfitB => self.profit_b_offset,
            TradePhase::Idle | TradePhase::Positioned => OverPrice::new(0, 0),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            open_threshold: 2,
            stop_loss_threshold: 2,
            stop_profit_threshold: 2,
            open_offset: OverPrice::new(5, 1),
            stop_loss_offset: OverPrice::new(5, 2),
            profit_a_offset: OverPrice::new(5, 2),
            profit_b_offset: OverPrice::new(2, 1),
        }
    }
}

/// Half-open hour range `[start, end)` within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    pub fn contains(&self, hour: u32) -> bool {
        self.start <= hour && hour < self.end
    }
}

/// Parse `"9-13,21-24"` into hour windows. Empty input means no filter.
pub fn parse_trading_hours(value: &str) -> Result<Vec<HourWindow>, String> {
    let mut windows = Vec::new();
    for part in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (start, end) = part
            .split_once('-')
            .ok_or_else(|| format!("expected START-END, got '{part}'"))?;
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|_| format!("invalid start hour in '{part}'"))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|_| format!("invalid end hour in '{part}'"))?;
        if start >= end || end > 24 {
            return Err(format!("hour window '{part}' must satisfy start < end <= 24"));
        }
        windows.push(HourWindow { start, end });
    }
    Ok(windows)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Lot size of every order.
    pub volume: i64,
    /// Minimum price increment.
    pub price_tick: f64,
    /// Span of the time-bounded entry window, in seconds.
    pub entry_window_secs: i64,
    /// Capacity of the count-bounded volatility window.
    pub wave_window_ticks: usize,
    /// Window high must reach `low * (1 + breakout_pct)` for a breakout.
    pub breakout_pct: f64,
    /// Ask-side dominance holds when `bid_total * ratio <= ask_total`.
    pub open_imbalance_ratio: f64,
    pub open_ask_volume_threshold: i64,
    /// First opening attempt uses the wide offset only this close to the session low.
    pub open_near_low_points: f64,
    /// Adverse ticks tolerated before stopping out.
    pub stop_loss_adverse_ticks: u32,
    pub profit_a_points: f64,
    /// Profit A retrace holds when `profit <= peak * ratio`.
    pub profit_retrace_ratio: f64,
    pub profit_b_points: f64,
    /// Range compression holds when `high - low < wave_epsilon`.
    pub wave_epsilon: f64,
    /// Cover-side dominance holds when `bid_total >= ask_total * ratio`.
    pub cover_imbalance_ratio: f64,
    pub cover_min_bid_volume: i64,
    /// Entries suspend when realized P&L falls under `peak * ratio`.
    pub session_drawdown_ratio: f64,
    /// Entries suspend when realized P&L falls below `-max_session_loss`.
    pub max_session_loss: f64,
    pub retry: RetryConfig,
    /// Ticks outside these windows are ignored. Empty accepts every tick.
    pub trading_hours: Vec<HourWindow>,
    /// Ticks at or after this hour belong to the next day's session.
    pub night_rollover_hour: Option<u32>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            volume: 1,
            price_tick: 1.0,
            entry_window_secs: 600,
            wave_window_ticks: 30,
            breakout_pct: 0.008,
            open_imbalance_ratio: 3.0,
            open_ask_volume_threshold: 150,
            open_near_low_points: 10.0,
            stop_loss_adverse_ticks: 5,
            profit_a_points: 20.0,
            profit_retrace_ratio: 0.7,
            profit_b_points: 5.0,
            wave_epsilon: 5.0,
            cover_imbalance_ratio: 3.0,
            cover_min_bid_volume: 50,
            session_drawdown_ratio: 0.5,
            max_session_loss: 10_000.0,
            retry: RetryConfig::default(),
            trading_hours: Vec::new(),
            night_rollover_hour: None,
        }
    }
}

impl StrategyConfig {
    /// Read `[strategy]`, `[retry]` and `[session]`, falling back to defaults
    /// for absent keys, then validate the result.
    pub fn from_config(port: &dyn ConfigPort) -> Result<Self, EngineError> {
        let d = StrategyConfig::default();
        let r = &d.retry;

        let trading_hours = match port.get_string("session", "trading_hours") {
            Some(raw) => parse_trading_hours(&raw)
                .map_err(|reason| EngineError::invalid("session", "trading_hours", reason))?,
            None => Vec::new(),
        };
        let night_rollover_hour = match port.get_string("session", "night_rollover_hour") {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| {
                        EngineError::invalid("session", "night_rollover_hour", "expected an hour 1-23")
                    })?,
            ),
            _ => None,
        };

        let config = StrategyConfig {
            volume: port.get_int("strategy", "volume", d.volume)?,
            price_tick: port.get_double("strategy", "price_tick", d.price_tick)?,
            entry_window_secs: port.get_int("strategy", "entry_window_secs", d.entry_window_secs)?,
            wave_window_ticks: count(port, "strategy", "wave_window_ticks", d.wave_window_ticks as i64)?
                as usize,
            breakout_pct: port.get_double("strategy", "breakout_pct", d.breakout_pct)?,
            open_imbalance_ratio: port.get_double(
                "strategy",
                "open_imbalance_ratio",
                d.open_imbalance_ratio,
            )?,
            open_ask_volume_threshold: port.get_int(
                "strategy",
                "open_ask_volume_threshold",
                d.open_ask_volume_threshold,
            )?,
            open_near_low_points: port.get_double(
                "strategy",
                "open_near_low_points",
                d.open_near_low_points,
            )?,
            stop_loss_adverse_ticks: count(
                port,
                "strategy",
                "stop_loss_adverse_ticks",
                d.stop_loss_adverse_ticks as i64,
            )?,
            profit_a_points: port.get_double("strategy", "profit_a_points", d.profit_a_points)?,
            profit_retrace_ratio: port.get_double(
                "strategy",
                "profit_retrace_ratio",
                d.profit_retrace_ratio,
            )?,
            profit_b_points: port.get_double("strategy", "profit_b_points", d.profit_b_points)?,
            wave_epsilon: port.get_double("strategy", "wave_epsilon", d.wave_epsilon)?,
            cover_imbalance_ratio: port.get_double(
                "strategy",
                "cover_imbalance_ratio",
                d.cover_imbalance_ratio,
            )?,
            cover_min_bid_volume: port.get_int(
                "strategy",
                "cover_min_bid_volume",
                d.cover_min_bid_volume,
            )?,
            session_drawdown_ratio: port.get_double(
                "strategy",
                "session_drawdown_ratio",
                d.session_drawdown_ratio,
            )?,
            max_session_loss: port.get_double("strategy", "max_session_loss", d.max_session_loss)?,
            retry: RetryConfig {
                open_threshold: count(port, "retry", "open_threshold", r.open_threshold as i64)?,
                stop_loss_threshold: count(
                    port,
                    "retry",
                    "stop_loss_threshold",
                    r.stop_loss_threshold as i64,
                )?,
                stop_profit_threshold: count(
                    port,
                    "retry",
                    "stop_profit_threshold",
                    r.stop_profit_threshold as i64,
                )?,
                open_offset: over_price(port, "open", r.open_offset)?,
                stop_loss_offset: over_price(port, "stop_loss", r.stop_loss_offset)?,
                profit_a_offset: over_price(port, "profit_a", r.profit_a_offset)?,
                profit_b_offset: over_price(port, "profit_b", r.profit_b_offset)?,
            },
            trading_hours,
            night_rollover_hour,
        };

        config_validation::validate_strategy_config(&config)?;
        Ok(config)
    }

    pub fn entry_window_span(&self) -> Duration {
        Duration::seconds(self.entry_window_secs)
    }

    /// Whether the tick's wall-clock hour falls inside the trading hours.
    pub fn accepts(&self, timestamp: NaiveDateTime) -> bool {
        self.trading_hours.is_empty()
            || self
                .trading_hours
                .iter()
                .any(|w| w.contains(timestamp.hour()))
    }
}

fn count(port: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<u32, EngineError> {
    let value = port.get_int(section, key, default)?;
    u32::try_from(value).map_err(|_| EngineError::invalid(section, key, "must be a non-negative count"))
}

fn over_price(port: &dyn ConfigPort, prefix: &str, default: OverPrice) -> Result<OverPrice, EngineError> {
    Ok(OverPrice {
        first: count(port, "retry", &format!("{prefix}_offset_first"), default.first as i64)?,
        retry: count(port, "retry", &format!("{prefix}_offset_retry"), default.retry as i64)?,
    })
}
