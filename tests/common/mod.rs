#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use ticktrader::domain::retry::PendingOrderIntent;
use ticktrader::domain::state_machine::{Fill, StateSnapshot};
pub use ticktrader::domain::tick::{BookLevel, DEPTH, TickSnapshot};
use ticktrader::ports::observer_port::StateObserver;
use ticktrader::ports::order_gateway::OrderGateway;

/// Gateway call as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    CancelAll,
    Submit(PendingOrderIntent),
}

#[derive(Debug, Default)]
pub struct RecordingGateway {
    pub calls: Vec<GatewayCall>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<&PendingOrderIntent> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                GatewayCall::Submit(intent) => Some(intent),
                GatewayCall::CancelAll => None,
            })
            .collect()
    }

    pub fn last_submitted(&self) -> Option<&PendingOrderIntent> {
        self.submitted().last().copied()
    }
}

impl OrderGateway for RecordingGateway {
    fn submit(&mut self, intent: &PendingOrderIntent) {
        self.calls.push(GatewayCall::Submit(intent.clone()));
    }

    fn cancel_all(&mut self) {
        self.calls.push(GatewayCall::CancelAll);
    }
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub snapshots: Vec<StateSnapshot>,
}

impl StateObserver for RecordingObserver {
    fn notify(&mut self, snapshot: &StateSnapshot) {
        self.snapshots.push(snapshot.clone());
    }
}

pub fn session_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(21, 0, 0)
        .unwrap()
}

pub fn at(secs: i64) -> NaiveDateTime {
    session_start() + Duration::seconds(secs)
}

/// Tick with a flat book one point either side of `last`, `bid_each` and
/// `ask_each` lots resting on every level.
pub fn make_tick(secs: i64, last: f64, bid_each: i64, ask_each: i64) -> TickSnapshot {
    make_tick_at(at(secs), last, bid_each, ask_each)
}

pub fn make_tick_at(timestamp: NaiveDateTime, last: f64, bid_each: i64, ask_each: i64) -> TickSnapshot {
    TickSnapshot {
        timestamp,
        last_price: last,
        open_price: last,
        bids: [BookLevel::new(last - 1.0, bid_each); DEPTH],
        asks: [BookLevel::new(last + 1.0, ask_each); DEPTH],
    }
}

pub fn shared(tick: TickSnapshot) -> Arc<TickSnapshot> {
    Arc::new(tick)
}

pub fn make_fill(intent: &PendingOrderIntent, price: f64, quantity: i64, secs: i64) -> Fill {
    Fill {
        price,
        quantity,
        order_seq: intent.order_seq,
        timestamp: at(secs),
    }
}

/// CSV row in the recorded tick format.
pub fn csv_row(tick: &TickSnapshot) -> String {
    let mut cols = vec![
        tick.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        tick.last_price.to_string(),
        tick.open_price.to_string(),
    ];
    cols.extend(tick.bids.iter().map(|l| l.price.to_string()));
    cols.extend(tick.bids.iter().map(|l| l.volume.to_string()));
    cols.extend(tick.asks.iter().map(|l| l.price.to_string()));
    cols.extend(tick.asks.iter().map(|l| l.volume.to_string()));
    cols.join(",")
}
