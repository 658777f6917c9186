//! Named reporting periods and their resolved windows

use crate::error::{AnalyticsError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named reporting period
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Quarter,
        Timeframe::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Quarter => "quarter",
            Timeframe::Year => "year",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::Week => Duration::days(7),
            Timeframe::Month => Duration::days(30),
            Timeframe::Quarter => Duration::days(90),
            Timeframe::Year => Duration::days(365),
        }
    }

    /// Resolve this period into a concrete window ending at `now`
    pub fn resolve(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow {
            start: now - self.duration(),
            end: now,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "quarter" => Ok(Timeframe::Quarter),
            "year" => Ok(Timeframe::Year),
            _ => Err(AnalyticsError::invalid_timeframe(s)),
        }
    }
}

/// Resolved `[start, end)` interval
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Whether a creation timestamp falls inside the window.
    ///
    /// Records are fetched at `end`, so anything created at or after `start`
    /// counts; a missing timestamp is never inside a window.
    pub fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        at.map_or(false, |at| at >= self.start)
    }
}
