//! Configuration validation.
//!
//! Rejects out-of-range values before a state machine is built.

use crate::domain::config::{OverPrice, StrategyConfig};
use crate::domain::error::EngineError;

pub fn validate_strategy_config(config: &StrategyConfig) -> Result<(), EngineError> {
    validate_volume(config)?;
    validate_price_tick(config)?;
    validate_windows(config)?;
    validate_entry(config)?;
    validate_exits(config)?;
    validate_session_gate(config)?;
    validate_retry(config)?;
    validate_rollover(config)?;
    Ok(())
}

fn validate_volume(config: &StrategyConfig) -> Result<(), EngineError> {
    if config.volume < 1 {
        return Err(EngineError::invalid(
            "strategy",
            "volume",
            "volume must be at least 1",
        ));
    }
    Ok(())
}

fn validate_price_tick(config: &StrategyConfig) -> Result<(), EngineError> {
    if !(config.price_tick > 0.0) {
        return Err(EngineError::invalid(
            "strategy",
            "price_tick",
            "price_tick must be positive",
        ));
    }
    Ok(())
}

fn validate_windows(config: &StrategyConfig) -> Result<(), EngineError> {
    if config.entry_window_secs <= 0 {
        return Err(EngineError::invalid(
            "strategy",
            "entry_window_secs",
            "entry_window_secs must be positive",
        ));
    }
    if config.wave_window_ticks == 0 {
        return Err(EngineError::invalid(
            "strategy",
            "wave_window_ticks",
            "wave_window_ticks must be at least 1",
        ));
    }
    Ok(())
}

fn validate_entry(config: &StrategyConfig) -> Result<(), EngineError> {
    non_negative("breakout_pct", config.breakout_pct)?;
    positive("open_imbalance_ratio", config.open_imbalance_ratio)?;
    if config.open_ask_volume_threshold < 0 {
        return Err(EngineError::invalid(
            "strategy",
            "open_ask_volume_threshold",
            "open_ask_volume_threshold must be non-negative",
        ));
    }
    non_negative("open_near_low_points", config.open_near_low_points)?;
    Ok(())
}

fn validate_exits(config: &StrategyConfig) -> Result<(), EngineError> {
    non_negative("profit_a_points", config.profit_a_points)?;
    non_negative("profit_b_points", config.profit_b_points)?;
    unit_interval("profit_retrace_ratio", config.profit_retrace_ratio)?;
    positive("wave_epsilon", config.wave_epsilon)?;
    positive("cover_imbalance_ratio", config.cover_imbalance_ratio)?;
    if config.cover_min_bid_volume < 0 {
        return Err(EngineError::invalid(
            "strategy",
            "cover_min_bid_volume",
            "cover_min_bid_volume must be non-negative",
        ));
    }
    Ok(())
}

fn validate_session_gate(config: &StrategyConfig) -> Result<(), EngineError> {
    unit_interval("session_drawdown_ratio", config.session_drawdown_ratio)?;
    non_negative("max_session_loss", config.max_session_loss)?;
    Ok(())
}

fn validate_retry(config: &StrategyConfig) -> Result<(), EngineError> {
    let retry = &config.retry;
    offsets("open", retry.open_offset)?;
    offsets("stop_loss", retry.stop_loss_offset)?;
    offsets("profit_a", retry.profit_a_offset)?;
    offsets("profit_b", retry.profit_b_offset)?;
    Ok(())
}

fn validate_rollover(config: &StrategyConfig) -> Result<(), EngineError> {
    match config.night_rollover_hour {
        Some(hour) if hour == 0 || hour > 23 => Err(EngineError::invalid(
            "session",
            "night_rollover_hour",
            "night_rollover_hour must be between 1 and 23",
        )),
        _ => Ok(()),
    }
}

fn offsets(prefix: &str, over_price: OverPrice) -> Result<(), EngineError> {
    if over_price.retry > over_price.first {
        return Err(EngineError::invalid(
            "retry",
            &format!("{prefix}_offset_retry"),
            "retry offset must not be wider than the first-attempt offset",
        ));
    }
    Ok(())
}

fn positive(key: &str, value: f64) -> Result<(), EngineError> {
    if !(value > 0.0) {
        return Err(EngineError::invalid(
            "strategy",
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(())
}

fn non_negative(key: &str, value: f64) -> Result<(), EngineError> {
    if !(value >= 0.0) {
        return Err(EngineError::invalid(
            "strategy",
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(())
}

fn unit_interval(key: &str, value: f64) -> Result<(), EngineError> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(EngineError::invalid(
            "strategy",
            key,
            format!("{key} must be in (0, 1]"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_key(config: StrategyConfig) -> String {
        match validate_strategy_config(&config).unwrap_err() {
            EngineError::ConfigInvalid { key, .. } => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn defaults_pass() {
        assert!(validate_strategy_config(&StrategyConfig::default()).is_ok());
    }

    #[test]
    fn zero_volume_fails() {
        let config = StrategyConfig {
            volume: 0,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "volume");
    }

    #[test]
    fn non_positive_price_tick_fails() {
        let config = StrategyConfig {
            price_tick: 0.0,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "price_tick");
    }

    #[test]
    fn nan_price_tick_fails() {
        let config = StrategyConfig {
            price_tick: f64::NAN,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "price_tick");
    }

    #[test]
    fn zero_window_span_fails() {
        let config = StrategyConfig {
            entry_window_secs: 0,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "entry_window_secs");
    }

    #[test]
    fn zero_wave_capacity_fails() {
        let config = StrategyConfig {
            wave_window_ticks: 0,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "wave_window_ticks");
    }

    #[test]
    fn negative_breakout_pct_fails() {
        let config = StrategyConfig {
            breakout_pct: -0.01,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "breakout_pct");
    }

    #[test]
    fn negative_ask_volume_threshold_fails() {
        let config = StrategyConfig {
            open_ask_volume_threshold: -5,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "open_ask_volume_threshold");
    }

    #[test]
    fn negative_profit_points_fail() {
        let config = StrategyConfig {
            profit_b_points: -1.0,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "profit_b_points");
    }

    #[test]
    fn retrace_ratio_above_one_fails() {
        let config = StrategyConfig {
            profit_retrace_ratio: 1.5,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "profit_retrace_ratio");
    }

    #[test]
    fn zero_drawdown_ratio_fails() {
        let config = StrategyConfig {
            session_drawdown_ratio: 0.0,
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "session_drawdown_ratio");
    }

    #[test]
    fn retry_offset_wider_than_first_fails() {
        let mut config = StrategyConfig::default();
        config.retry.profit_b_offset = OverPrice::new(1, 3);
        assert_eq!(invalid_key(config), "profit_b_offset_retry");
    }

    #[test]
    fn rollover_hour_out_of_range_fails() {
        let config = StrategyConfig {
            night_rollover_hour: Some(24),
            ..StrategyConfig::default()
        };
        assert_eq!(invalid_key(config), "night_rollover_hour");
    }
}
