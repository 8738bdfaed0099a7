//! Recorded tick CSV adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a header row and the
//! columns `datetime,last_price,open_price`, then `bid_price_1..5`,
//! `bid_volume_1..5`, `ask_price_1..5`, `ask_volume_1..5`.

use crate::domain::error::EngineError;
use crate::domain::tick::{BookLevel, DEPTH, TickSnapshot};
use crate::ports::tick_source::TickSource;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

const COLUMNS: usize = 3 + 4 * DEPTH;
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub struct CsvTickAdapter {
    base_path: PathBuf,
}

impl CsvTickAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

/// Header line matching the expected column order.
pub fn header() -> String {
    let mut columns = vec![
        "datetime".to_string(),
        "last_price".to_string(),
        "open_price".to_string(),
    ];
    for side in ["bid", "ask"] {
        for field in ["price", "volume"] {
            columns.extend((1..=DEPTH).map(|level| format!("{side}_{field}_{level}")));
        }
    }
    columns.join(",")
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, EngineError> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| EngineError::TickData {
            reason: format!("invalid datetime '{}'", value),
        })
}

fn field<T: FromStr>(record: &csv::StringRecord, idx: usize, line: u64) -> Result<T, EngineError>
where
    T::Err: std::fmt::Display,
{
    let raw = record.get(idx).ok_or_else(|| EngineError::TickData {
        reason: format!("line {}: missing column {}", line, idx + 1),
    })?;
    raw.trim().parse().map_err(|e| EngineError::TickData {
        reason: format!("line {}: invalid value '{}' in column {}: {}", line, raw, idx + 1, e),
    })
}

fn parse_record(record: &csv::StringRecord) -> Result<TickSnapshot, EngineError> {
    let line = record.position().map_or(0, |p| p.line());
    if record.len() < COLUMNS {
        return Err(EngineError::TickData {
            reason: format!(
                "line {}: expected {} columns, found {}",
                line,
                COLUMNS,
                record.len()
            ),
        });
    }

    let timestamp = parse_datetime(record.get(0).unwrap_or_default())?;
    let last_price: f64 = field(record, 1, line)?;
    let open_price: f64 = field(record, 2, line)?;

    let mut bids = [BookLevel::default(); DEPTH];
    let mut asks = [BookLevel::default(); DEPTH];
    for level in 0..DEPTH {
        bids[level] = BookLevel::new(
            field(record, 3 + level, line)?,
            field(record, 3 + DEPTH + level, line)?,
        );
        asks[level] = BookLevel::new(
            field(record, 3 + 2 * DEPTH + level, line)?,
            field(record, 3 + 3 * DEPTH + level, line)?,
        );
    }

    Ok(TickSnapshot {
        timestamp,
        last_price,
        open_price,
        bids,
        asks,
    })
}

impl TickSource for CsvTickAdapter {
    fn fetch_ticks(&self, symbol: &str) -> Result<Vec<TickSnapshot>, EngineError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| EngineError::TickData {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut ticks = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| EngineError::TickData {
                reason: format!("CSV parse error: {}", e),
            })?;
            ticks.push(parse_record(&record)?);
        }
        Ok(ticks)
    }

    fn list_symbols(&self) -> Result<Vec<String>, EngineError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| EngineError::TickData {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}
