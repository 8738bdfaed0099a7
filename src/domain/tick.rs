//! Market-depth tick snapshot.

use chrono::NaiveDateTime;

use super::error::InvariantViolation;

/// Number of book levels carried on each side.
pub const DEPTH: usize = 5;

/// One price level of the order book.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BookLevel {
    pub price: f64,
    pub volume: i64,
}

impl BookLevel {
    pub fn new(price: f64, volume: i64) -> Self {
        BookLevel { price, volume }
    }
}

/// Immutable market-depth snapshot. Windows share these behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    pub timestamp: NaiveDateTime,
    pub last_price: f64,
    /// Today's session open price.
    pub open_price: f64,
    pub bids: [BookLevel; DEPTH],
    pub asks: [BookLevel; DEPTH],
}

impl TickSnapshot {
    pub fn best_bid(&self) -> f64 {
        self.bids[0].price
    }

    pub fn best_ask(&self) -> f64 {
        self.asks[0].price
    }

    /// Sum of the five bid volumes.
    pub fn bid_volume_total(&self) -> i64 {
        self.bids.iter().map(|l| l.volume).sum()
    }

    /// Sum of the five ask volumes.
    pub fn ask_volume_total(&self) -> i64 {
        self.asks.iter().map(|l| l.volume).sum()
    }

    /// Check the per-tick invariants that do not depend on stream history.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let negative = self
            .bids
            .iter()
            .chain(self.asks.iter())
            .any(|l| l.volume < 0);
        if negative {
            return Err(InvariantViolation::NegativeVolume {
                timestamp: self.timestamp,
            });
        }
        Ok(())
    }
}
