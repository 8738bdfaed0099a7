//! Position bookkeeping for a single instrument.

use chrono::NaiveDateTime;

/// Mutable position state owned by one state machine.
///
/// `size` is signed: positive long, negative short, zero flat. Profit
/// figures are in price points per unit, signed so that a gain on the open
/// lot is positive regardless of direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionState {
    pub size: i64,
    pub entry_price: f64,
    pub entry_time: Option<NaiveDateTime>,
    /// Realized P&L of the session, in price points times quantity.
    pub realized_pnl: f64,
    /// Highest `realized_pnl` seen this session.
    pub session_peak_pnl: f64,
    /// Maximum favorable excursion of the open lot, per unit.
    pub peak_profit: f64,
    pub favorable_ticks: u32,
    pub adverse_ticks: u32,
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    pub fn is_short(&self) -> bool {
        self.size < 0
    }

    /// Per-unit open profit at `price`: `entry - price` for a short lot,
    /// `price - entry` for a long one, zero when flat.
    pub fn open_profit(&self, price: f64) -> f64 {
        match self.size.signum() {
            -1 => self.entry_price - price,
            1 => price - self.entry_price,
            _ => 0.0,
        }
    }

    /// Classify a tick against the open lot and raise the peak if needed.
    pub fn observe(&mut self, price: f64) {
        if self.is_flat() {
            return;
        }
        let profit = self.open_profit(price);
        if profit < 0.0 {
            self.adverse_ticks += 1;
        } else {
            self.favorable_ticks += 1;
        }
        if profit > self.peak_profit {
            self.peak_profit = profit;
        }
    }

    /// Add a short fill to the open lot at a volume-weighted entry price.
    pub fn add_short(&mut self, price: f64, quantity: i64, time: NaiveDateTime) {
        let held = self.size.unsigned_abs() as f64;
        let added = quantity as f64;
        self.entry_price = if held == 0.0 {
            price
        } else {
            (self.entry_price * held + price * added) / (held + added)
        };
        if self.entry_time.is_none() {
            self.entry_time = Some(time);
        }
        self.size -= quantity;
    }

    /// Begin tracking a freshly completed lot.
    pub fn start_lot(&mut self) {
        self.peak_profit = 0.0;
        self.favorable_ticks = 0;
        self.adverse_ticks = 0;
    }

    /// Cover `quantity` of the short lot at `price`. Returns the realized P&L.
    pub fn cover_short(&mut self, price: f64, quantity: i64) -> f64 {
        let pnl = (self.entry_price - price) * quantity as f64;
        self.size += quantity;
        self.realized_pnl += pnl;
        if self.realized_pnl > self.session_peak_pnl {
            self.session_peak_pnl = self.realized_pnl;
        }
        if self.size == 0 {
            self.clear_lot();
        }
        pnl
    }

    /// Drop the lot while keeping the session's realized figures.
    pub fn clear_lot(&mut self) {
        self.size = 0;
        self.entry_price = 0.0;
        self.entry_time = None;
        self.start_lot();
    }
}

/// One completed open/cover cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedRound {
    pub open_time: NaiveDateTime,
    pub open_price: f64,
    pub close_time: NaiveDateTime,
    pub close_price: f64,
    /// Signed quantity of the lot (negative for short).
    pub quantity: i64,
    pub pnl: f64,
    pub open_memo: String,
    pub close_memo: String,
}
