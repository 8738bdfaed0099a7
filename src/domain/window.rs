//! Rolling windows over recent ticks.
//!
//! A window is a strict FIFO of shared tick snapshots. Every push applies the
//! eviction policy before returning, so queries always see a window that
//! satisfies its bound. Mean, min and max are maintained incrementally: the
//! running sum is adjusted on push and evict, and min/max use monotonic
//! candidate queues so neither query rescans the contents.

use chrono::{Duration, NaiveDateTime};
use std::collections::VecDeque;
use std::sync::Arc;

use super::tick::TickSnapshot;

/// Eviction policy of a [`RollingWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowBound {
    /// Keep snapshots no older than `span` relative to the newest arrival.
    Span(Duration),
    /// Keep at most this many snapshots.
    Capacity(usize),
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    bound: WindowBound,
    ticks: VecDeque<Arc<TickSnapshot>>,
    /// Sequence number of the front snapshot.
    head_seq: u64,
    next_seq: u64,
    price_sum: f64,
    max_candidates: VecDeque<(u64, f64)>,
    min_candidates: VecDeque<(u64, f64)>,
}

impl RollingWindow {
    pub fn new(bound: WindowBound) -> Self {
        RollingWindow {
            bound,
            ticks: VecDeque::new(),
            head_seq: 0,
            next_seq: 0,
            price_sum: 0.0,
            max_candidates: VecDeque::new(),
            min_candidates: VecDeque::new(),
        }
    }

    pub fn time_bounded(span: Duration) -> Self {
        Self::new(WindowBound::Span(span))
    }

    pub fn count_bounded(capacity: usize) -> Self {
        Self::new(WindowBound::Capacity(capacity))
    }

    pub fn bound(&self) -> WindowBound {
        self.bound
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn oldest(&self) -> Option<&Arc<TickSnapshot>> {
        self.ticks.front()
    }

    pub fn newest(&self) -> Option<&Arc<TickSnapshot>> {
        self.ticks.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TickSnapshot>> {
        self.ticks.iter()
    }

    /// Append a snapshot, then evict per the window's bound.
    pub fn push(&mut self, tick: Arc<TickSnapshot>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let price = tick.last_price;
        let reference = tick.timestamp;

        while self
            .max_candidates
            .back()
            .is_some_and(|&(_, p)| p <= price)
        {
            self.max_candidates.pop_back();
        }
        self.max_candidates.push_back((seq, price));

        while self
            .min_candidates
            .back()
            .is_some_and(|&(_, p)| p >= price)
        {
            self.min_candidates.pop_back();
        }
        self.min_candidates.push_back((seq, price));

        self.price_sum += price;
        self.ticks.push_back(tick);

        match self.bound {
            WindowBound::Span(_) => self.evict_stale(reference),
            WindowBound::Capacity(capacity) => {
                while self.ticks.len() > capacity {
                    self.pop_front();
                }
            }
        }
    }

    /// Remove snapshots older than the span relative to `reference_time`.
    /// No-op for count-bounded windows.
    pub fn evict_stale(&mut self, reference_time: NaiveDateTime) {
        let WindowBound::Span(span) = self.bound else {
            return;
        };
        while self
            .ticks
            .front()
            .is_some_and(|t| reference_time - t.timestamp > span)
        {
            self.pop_front();
        }
    }

    /// `(low, high)` of last prices, `None` on an empty window.
    pub fn min_max_price(&self) -> Option<(f64, f64)> {
        let (_, low) = self.min_candidates.front()?;
        let (_, high) = self.max_candidates.front()?;
        Some((*low, *high))
    }

    /// `high - low`, `None` on an empty window.
    pub fn price_range(&self) -> Option<f64> {
        self.min_max_price().map(|(low, high)| high - low)
    }

    pub fn mean_price(&self) -> Option<f64> {
        if self.ticks.is_empty() {
            None
        } else {
            Some(self.price_sum / self.ticks.len() as f64)
        }
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
        self.max_candidates.clear();
        self.min_candidates.clear();
        self.price_sum = 0.0;
        self.head_seq = self.next_seq;
    }

    fn pop_front(&mut self) {
        let Some(tick) = self.ticks.pop_front() else {
            return;
        };
        self.price_sum -= tick.last_price;
        self.head_seq += 1;
        if self.ticks.is_empty() {
            // Resync so float drift never outlives the contents.
            self.price_sum = 0.0;
        }
        while self
            .max_candidates
            .front()
            .is_some_and(|&(seq, _)| seq < self.head_seq)
        {
            self.max_candidates.pop_front();
        }
        while self
            .min_candidates
            .front()
            .is_some_and(|&(seq, _)| seq < self.head_seq)
        {
            self.min_candidates.pop_front();
        }
    }
}
