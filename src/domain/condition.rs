//! Stateless market predicates.
//!
//! Each predicate is a pure function of a tick, a window and the configured
//! thresholds. The state machine combines them per phase; none of them
//! mutate anything.

use std::fmt;

use super::tick::TickSnapshot;
use super::window::RollingWindow;

/// A predicate that fired, recorded in the order memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Breakout,
    AskDominance,
    LargeAskVolume,
    AdverseTicks,
    ProfitRetrace,
    BidDominance,
    RangeCompression,
}

impl Condition {
    pub fn marker(self) -> &'static str {
        match self {
            Condition::Breakout => "breakout",
            Condition::AskDominance => "ask_imbalance",
            Condition::LargeAskVolume => "ask_volume",
            Condition::AdverseTicks => "loss_ticks",
            Condition::ProfitRetrace => "retrace",
            Condition::BidDominance => "bid_imbalance",
            Condition::RangeCompression => "low_wave",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// `bid_total * ratio <= ask_total`.
pub fn ask_dominance(tick: &TickSnapshot, ratio: f64) -> bool {
    tick.bid_volume_total() as f64 * ratio <= tick.ask_volume_total() as f64
}

/// `ask_total >= threshold`.
pub fn large_ask_volume(tick: &TickSnapshot, threshold: i64) -> bool {
    tick.ask_volume_total() >= threshold
}

/// `bid_total >= ask_total * ratio` with at least `min_bid` resting on the bid.
pub fn bid_dominance(tick: &TickSnapshot, ratio: f64, min_bid: i64) -> bool {
    let bid = tick.bid_volume_total();
    bid as f64 >= tick.ask_volume_total() as f64 * ratio && bid > min_bid
}

/// `high >= low * (1 + pct)`. False on an empty window.
pub fn breakout(window: &RollingWindow, pct: f64) -> bool {
    window
        .min_max_price()
        .is_some_and(|(low, high)| high >= low * (1.0 + pct))
}

/// `high - low < epsilon`. False on an empty window.
pub fn range_compressed(window: &RollingWindow, epsilon: f64) -> bool {
    window.price_range().is_some_and(|range| range < epsilon)
}

/// Whether the window's range has settled back inside the breakout band:
/// `high <= low * (1 + pct)`. False on an empty window.
pub fn within_band(window: &RollingWindow, pct: f64) -> bool {
    window
        .min_max_price()
        .is_some_and(|(low, high)| high <= low * (1.0 + pct))
}

/// `current <= peak * retrace_ratio`: profit has given back at least
/// `1 - retrace_ratio` of its peak.
pub fn drawdown_from_peak(current: f64, peak: f64, retrace_ratio: f64) -> bool {
    current <= peak * retrace_ratio
}
