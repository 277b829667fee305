// src/utils/time.rs

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

/// Source of "now" for session timing and score dates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Used by tests to pin durations.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance_ms(&self, ms: i64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs * 1000);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.millis.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Milliseconds to whole seconds, rounding half up.
pub fn ms_to_rounded_secs(ms: i64) -> u64 {
    (ms.max(0) as f64 / 1000.0).round() as u64
}

/// `m:ss`: minutes unpadded, seconds zero-padded to two digits.
pub fn format_time(total_seconds: u64) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Human label for a stored ISO-8601 date relative to `now`.
///
/// Same calendar day is "Today", one day apart "Yesterday", up to a week
/// "N days ago", anything older the calendar date. Unparseable input yields
/// "Unknown date".
pub fn format_relative_date(date: &str, now: DateTime<Utc>) -> String {
    let parsed = match DateTime::parse_from_rfc3339(date) {
        Ok(d) => d.with_timezone(&Utc),
        Err(_) => return "Unknown date".to_string(),
    };

    let days = (now.date_naive() - parsed.date_naive()).num_days().abs();
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=7 => format!("{} days ago", days),
        _ => parsed.format("%d/%m/%Y").to_string(),
    }
}
