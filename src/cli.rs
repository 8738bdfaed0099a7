//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_tick_adapter::CsvTickAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::StrategyConfig;
use crate::domain::error::EngineError;
use crate::domain::position::ClosedRound;
use crate::ports::tick_source::TickSource;
use crate::replay::{self, ReplayOptions, ReplayResult};

#[derive(Parser, Debug)]
#[command(name = "ticktrader", about = "Tick-driven intraday trading engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay recorded ticks through the strategy with a paper gateway
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding <SYMBOL>.csv tick files
        #[arg(short, long)]
        ticks: PathBuf,
        /// Overrides [replay] symbol
        #[arg(short, long)]
        symbol: Option<String>,
        /// Write closed rounds as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with recorded ticks
    Symbols {
        #[arg(short, long)]
        ticks: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Replay {
            config,
            ticks,
            symbol,
            output,
        } => run_replay(&config, &ticks, symbol.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Symbols { ticks } => run_symbols(&ticks),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<(FileConfigAdapter, StrategyConfig), EngineError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = StrategyConfig::from_config(&adapter)?;
    Ok((adapter, config))
}

fn run_replay(
    config_path: &Path,
    ticks_dir: &Path,
    symbol: Option<&str>,
    output: Option<&Path>,
) -> Result<(), EngineError> {
    eprintln!("Loading config from {}", config_path.display());
    let (adapter, config) = load_config(config_path)?;
    let options = ReplayOptions::from_config(&adapter, symbol)?;

    eprintln!("Loading ticks for {} from {}", options.symbol, ticks_dir.display());
    let source = CsvTickAdapter::new(ticks_dir.to_path_buf());
    let ticks = source.fetch_ticks(&options.symbol)?;
    eprintln!("Replaying {} ticks...", ticks.len());

    let result = replay::run_replay_with(ticks, config, &options)?;
    print_summary(&result);

    if let Some(path) = output {
        write_rounds(path, &result.rounds)?;
        eprintln!("Rounds written to {}", path.display());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), EngineError> {
    eprintln!("Validating config: {}", config_path.display());
    let (_, config) = load_config(config_path)?;

    eprintln!("  volume:            {}", config.volume);
    eprintln!("  price_tick:        {}", config.price_tick);
    eprintln!("  entry window:      {}s", config.entry_window_secs);
    eprintln!("  wave window:       {} ticks", config.wave_window_ticks);
    eprintln!("  breakout_pct:      {}", config.breakout_pct);
    eprintln!(
        "  trading hours:     {}",
        if config.trading_hours.is_empty() {
            "all".to_string()
        } else {
            config
                .trading_hours
                .iter()
                .map(|w| format!("{}-{}", w.start, w.end))
                .collect::<Vec<_>>()
                .join(",")
        }
    );
    match config.night_rollover_hour {
        Some(hour) => eprintln!("  session rollover:  {hour}:00"),
        None => eprintln!("  session rollover:  midnight"),
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_symbols(ticks_dir: &Path) -> Result<(), EngineError> {
    let source = CsvTickAdapter::new(ticks_dir.to_path_buf());
    let symbols = source.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No tick files found in {}", ticks_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

fn print_summary(result: &ReplayResult) {
    println!("symbol:        {}", result.symbol);
    println!("ticks:         {}", result.ticks);
    println!("orders:        {}", result.orders);
    println!("fills:         {}", result.fills);
    println!(
        "rounds:        {} ({} winning)",
        result.rounds.len(),
        result.winning_rounds()
    );
    println!("realized pnl:  {:.2}", result.realized_pnl);
    println!("anomalies:     {}", result.anomalies);
    println!("final phase:   {}", result.final_phase);
}

pub fn write_rounds(path: &Path, rounds: &[ClosedRound]) -> Result<(), EngineError> {
    let csv_error = |e: csv::Error| EngineError::Io(std::io::Error::other(e));
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer
        .write_record([
            "open_time",
            "open_price",
            "close_time",
            "close_price",
            "quantity",
            "pnl",
            "open_memo",
            "close_memo",
        ])
        .map_err(csv_error)?;
    for round in rounds {
        writer
            .write_record([
                round.open_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                round.open_price.to_string(),
                round.close_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                round.close_price.to_string(),
                round.quantity.to_string(),
                format!("{:.2}", round.pnl),
                round.open_memo.clone(),
                round.close_memo.clone(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}
