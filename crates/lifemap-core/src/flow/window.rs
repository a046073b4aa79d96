//! Reporting windows.
//!
//! A window does two jobs: it scales passive spring capacity (given in hours
//! per week) to the length of the window, and it decides which logs count.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Fixed reporting bucket. Also the key of per-node manual overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "D", alias = "day")]
    Day,
    #[serde(rename = "W", alias = "week")]
    Week,
    #[serde(rename = "M", alias = "month")]
    Month,
    #[serde(rename = "Y", alias = "year")]
    Year,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [Self::Day, Self::Week, Self::Month, Self::Year];

    /// One-letter code used by the editor (`D`, `W`, `M`, `Y`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Day => "D",
            Self::Week => "W",
            Self::Month => "M",
            Self::Year => "Y",
        }
    }

    /// How far back logs are counted, in days.
    pub fn lookback_days(&self) -> f64 {
        match self {
            Self::Day => 1.0,
            Self::Week => 7.0,
            Self::Month => 30.0,
            Self::Year => 365.0,
        }
    }

    /// Multiplier applied to weekly capacity.
    pub fn weeks(&self) -> f64 {
        match self {
            Self::Day => 1.0 / 7.0,
            Self::Week => 1.0,
            Self::Month => 4.3,
            Self::Year => 52.0,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TimeRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "day" => Ok(Self::Day),
            "w" | "week" => Ok(Self::Week),
            "m" | "month" => Ok(Self::Month),
            "y" | "year" => Ok(Self::Year),
            other => Err(ValidationError::InvalidValue {
                field: "range".into(),
                message: format!("unknown range '{other}' (expected d, w, m or y)"),
            }),
        }
    }
}

/// The window a flow computation reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeWindow {
    Range { range: TimeRange },
    /// Inclusive calendar dates, interpreted in UTC. The end date extends
    /// through 23:59:59.999.
    Custom { start: NaiveDate, end: NaiveDate },
}

impl From<TimeRange> for TimeWindow {
    fn from(range: TimeRange) -> Self {
        Self::Range { range }
    }
}

impl TimeWindow {
    pub const DAY: Self = Self::Range { range: TimeRange::Day };
    pub const WEEK: Self = Self::Range { range: TimeRange::Week };
    pub const MONTH: Self = Self::Range { range: TimeRange::Month };
    pub const YEAR: Self = Self::Range { range: TimeRange::Year };

    /// Checked constructor for a custom window.
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self::Custom { start, end })
    }

    /// Override slot consulted for this window. Custom windows use Month.
    pub fn override_range(&self) -> TimeRange {
        match self {
            Self::Range { range } => *range,
            Self::Custom { .. } => TimeRange::Month,
        }
    }

    /// Multiplier applied to weekly spring capacity.
    ///
    /// Custom windows count whole-or-fractional weeks between the two dates,
    /// never less than one.
    pub fn time_scale(&self) -> f64 {
        match self {
            Self::Range { range } => range.weeks(),
            Self::Custom { start, end } => {
                let days = (*end - *start).num_days() as f64;
                (days / 7.0).max(1.0)
            }
        }
    }

    /// Whether a log stamped `timestamp` falls inside the window as seen at `now`.
    pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Range { range } => {
                let age_days = (now - timestamp).num_milliseconds() as f64 / MILLIS_PER_DAY;
                age_days <= range.lookback_days()
            }
            Self::Custom { start, end } => {
                let (from, to) = custom_bounds(*start, *end);
                timestamp >= from && timestamp <= to
            }
        }
    }
}

fn custom_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start.and_time(NaiveTime::MIN).and_utc();
    // The last representable date has no next midnight; clamp to the maximum.
    let to = end
        .succ_opt()
        .map(|next| next.and_time(NaiveTime::MIN).and_utc() - Duration::milliseconds(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (from, to)
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range { range } => write!(f, "{range}"),
            Self::Custom { start, end } => write!(f, "{start}..={end}"),
        }
    }
}
