//! CLI integration tests for config loading and recorded-tick replay.
//!
//! Tests cover:
//! - Config parsing from real INI files on disk
//! - Replay options and symbol resolution
//! - Tick CSV loading through the tick source
//! - Full pipeline: CSV ticks -> replay -> rounds CSV
//! - Argument parsing

mod common;

use clap::Parser;
use common::*;
use std::io::Write;
use std::path::Path;
use ticktrader::adapters::csv_tick_adapter::{self, CsvTickAdapter};
use ticktrader::cli::{self, Cli, Command};
use ticktrader::domain::error::EngineError;
use ticktrader::domain::phase::TradePhase;
use ticktrader::ports::tick_source::TickSource;
use ticktrader::replay::{self, ReplayOptions};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_ticks(dir: &Path, symbol: &str, ticks: &[TickSnapshot]) {
    let mut body = csv_tick_adapter::header();
    body.push('\n');
    for tick in ticks {
        body.push_str(&csv_row(tick));
        body.push('\n');
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), body).unwrap();
}

/// Breakout, paper fill, bid-dominance exit and cover fill: one round of +2.
fn one_round() -> Vec<TickSnapshot> {
    vec![
        make_tick(0, 100.0, 10, 10),
        make_tick(1, 103.0, 10, 40),
        make_tick(2, 103.0, 10, 10),
        make_tick(3, 93.0, 20, 5),
        make_tick(4, 93.0, 10, 10),
    ]
}

const VALID_INI: &str = r#"
[strategy]
volume = 1
price_tick = 1.0
entry_window_secs = 600
wave_window_ticks = 30
breakout_pct = 0.008
stop_loss_adverse_ticks = 5
profit_a_points = 20
profit_retrace_ratio = 0.7

[retry]
open_threshold = 2
open_offset_first = 5
open_offset_retry = 1

[session]
trading_hours = 9-15,21-24
night_rollover_hour = 21

[replay]
symbol = RB2405
auto_acknowledge = yes
"#;

mod config_loading {
    use super::*;

    #[test]
    fn valid_ini_loads() {
        let file = write_temp_ini(VALID_INI);
        let (adapter, config) = cli::load_config(file.path()).unwrap();
        assert_eq!(config.volume, 1);
        assert_eq!(config.wave_window_ticks, 30);
        assert_eq!(config.trading_hours.len(), 2);
        assert_eq!(config.night_rollover_hour, Some(21));

        let options = ReplayOptions::from_config(&adapter, None).unwrap();
        assert_eq!(options.symbol, "RB2405");
        assert!(options.auto_acknowledge);
    }

    #[test]
    fn empty_ini_uses_defaults() {
        let file = write_temp_ini("");
        let (_, config) = cli::load_config(file.path()).unwrap();
        assert_eq!(config, ticktrader::domain::config::StrategyConfig::default());
    }

    #[test]
    fn out_of_range_value_is_config_error() {
        let file = write_temp_ini("[strategy]\nvolume = 0\n");
        let err = cli::load_config(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref key, .. } if key == "volume"));
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn bad_trading_hours_is_config_error() {
        let file = write_temp_ini("[session]\ntrading_hours = 15-9\n");
        let err = cli::load_config(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid { ref section, .. } if section == "session"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = cli::load_config(Path::new("/nonexistent/ticktrader.ini")).unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse { .. }));
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn replay_symbol_required_without_override() {
        let file = write_temp_ini("[strategy]\nvolume = 1\n");
        let (adapter, _) = cli::load_config(file.path()).unwrap();
        assert!(matches!(
            ReplayOptions::from_config(&adapter, None),
            Err(EngineError::ConfigMissing { .. })
        ));
        let options = ReplayOptions::from_config(&adapter, Some("HC2405")).unwrap();
        assert_eq!(options.symbol, "HC2405");
    }
}

mod tick_files {
    use super::*;

    #[test]
    fn csv_ticks_load_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let ticks = one_round();
        write_ticks(dir.path(), "RB2405", &ticks);

        let source = CsvTickAdapter::new(dir.path().to_path_buf());
        let loaded = source.fetch_ticks("RB2405").unwrap();
        assert_eq!(loaded, ticks);
    }

    #[test]
    fn malformed_row_is_tick_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{}\n2024-03-04 21:00:00,abc\n", csv_tick_adapter::header());
        std::fs::write(dir.path().join("RB2405.csv"), body).unwrap();

        let source = CsvTickAdapter::new(dir.path().to_path_buf());
        let err = source.fetch_ticks("RB2405").unwrap_err();
        assert!(matches!(err, EngineError::TickData { .. }));
        assert_eq!(err.exit_status(), 3);
    }

    #[test]
    fn missing_symbol_is_tick_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvTickAdapter::new(dir.path().to_path_buf());
        assert!(matches!(
            source.fetch_ticks("NOPE"),
            Err(EngineError::TickData { .. })
        ));
    }

    #[test]
    fn symbols_listed_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_ticks(dir.path(), "RB2405", &one_round());
        write_ticks(dir.path(), "HC2405", &one_round());
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let source = CsvTickAdapter::new(dir.path().to_path_buf());
        assert_eq!(source.list_symbols().unwrap(), vec!["HC2405", "RB2405"]);
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn replay_from_files_writes_rounds() {
        let dir = tempfile::tempdir().unwrap();
        write_ticks(dir.path(), "RB2405", &one_round());
        let ini = write_temp_ini("[replay]\nsymbol = RB2405\n");

        let (adapter, config) = cli::load_config(ini.path()).unwrap();
        let options = ReplayOptions::from_config(&adapter, None).unwrap();
        let ticks = CsvTickAdapter::new(dir.path().to_path_buf())
            .fetch_ticks(&options.symbol)
            .unwrap();
        let result = replay::run_replay_with(ticks, config, &options).unwrap();

        assert_eq!(result.symbol, "RB2405");
        assert_eq!(result.ticks, 5);
        assert_eq!(result.orders, 2);
        assert_eq!(result.fills, 2);
        assert_eq!(result.rounds.len(), 1);
        assert_eq!(result.winning_rounds(), 1);
        assert_eq!(result.final_phase, TradePhase::Idle);
        // Short at 99, covered at bid1 92 + 5.
        assert_eq!(result.rounds[0].open_price, 99.0);
        assert_eq!(result.rounds[0].close_price, 97.0);
        assert_eq!(result.realized_pnl, 2.0);

        let out = dir.path().join("rounds.csv");
        cli::write_rounds(&out, &result.rounds).unwrap();
        let mut reader = csv::Reader::from_path(&out).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("open_time"));
        assert_eq!(headers.get(5), Some("pnl"));
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some("2024-03-04 21:00:02.000"));
        assert_eq!(rows[0].get(4), Some("-1"));
        assert_eq!(rows[0].get(5), Some("2.00"));
        assert!(rows[0].get(6).unwrap().starts_with("0os-breakout"));
        assert!(rows[0].get(7).unwrap().starts_with("-1sp-bid_imbalance"));
    }

    #[test]
    fn empty_rounds_write_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("rounds.csv");
        cli::write_rounds(&out, &[]).unwrap();
        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}

mod arguments {
    use super::*;

    #[test]
    fn replay_arguments_parse() {
        let cli = Cli::try_parse_from([
            "ticktrader",
            "replay",
            "--config",
            "strategy.ini",
            "--ticks",
            "data",
            "--symbol",
            "RB2405",
        ])
        .unwrap();
        match cli.command {
            Command::Replay {
                config,
                ticks,
                symbol,
                output,
            } => {
                assert_eq!(config, Path::new("strategy.ini"));
                assert_eq!(ticks, Path::new("data"));
                assert_eq!(symbol.as_deref(), Some("RB2405"));
                assert!(output.is_none());
            }
            other => panic!("expected replay, got {other:?}"),
        }
    }

    #[test]
    fn validate_requires_config() {
        assert!(Cli::try_parse_from(["ticktrader", "validate"]).is_err());
    }
}
