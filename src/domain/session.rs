//! Trading-session calendar and day-boundary detection.
//!
//! A tick belongs to the trading day its calendar reports. The detector
//! compares the incoming tick's trading day against the oldest snapshot in
//! the time-bounded window; a mismatch means the stream rolled over into a
//! new session and the state machine must reset.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use super::window::RollingWindow;

/// Maps a timestamp to the trading day it belongs to.
pub trait SessionCalendar: std::fmt::Debug + Send {
    fn trading_day(&self, timestamp: NaiveDateTime) -> NaiveDate;
}

/// Plain calendar date: every midnight starts a new session.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarDate;

impl SessionCalendar for CalendarDate {
    fn trading_day(&self, timestamp: NaiveDateTime) -> NaiveDate {
        timestamp.date()
    }
}

/// Exchange calendar with a night session: ticks at or after
/// `rollover_hour` trade for the following calendar day, so a night session
/// spanning midnight stays one session with the next day's day session.
#[derive(Debug, Clone, Copy)]
pub struct NightSession {
    pub rollover_hour: u32,
}

impl SessionCalendar for NightSession {
    fn trading_day(&self, timestamp: NaiveDateTime) -> NaiveDate {
        if timestamp.hour() >= self.rollover_hour {
            (timestamp + Duration::days(1)).date()
        } else {
            timestamp.date()
        }
    }
}

/// Build the calendar for an optional night-session rollover hour.
pub fn calendar_for(night_rollover_hour: Option<u32>) -> Box<dyn SessionCalendar> {
    match night_rollover_hour {
        Some(rollover_hour) => Box::new(NightSession { rollover_hour }),
        None => Box::new(CalendarDate),
    }
}

#[derive(Debug)]
pub struct SessionResetDetector {
    calendar: Box<dyn SessionCalendar>,
}

impl SessionResetDetector {
    pub fn new(calendar: Box<dyn SessionCalendar>) -> Self {
        SessionResetDetector { calendar }
    }

    pub fn trading_day(&self, timestamp: NaiveDateTime) -> NaiveDate {
        self.calendar.trading_day(timestamp)
    }

    /// Whether `incoming` starts a different session than the window's
    /// oldest snapshot. An empty window never triggers a reset.
    pub fn crosses_boundary(&self, window: &RollingWindow, incoming: NaiveDateTime) -> bool {
        window.oldest().is_some_and(|oldest| {
            self.trading_day(oldest.timestamp) != self.trading_day(incoming)
        })
    }
}
