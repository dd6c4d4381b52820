//! Opening ranges within a single calendar day.
//!
//! A [`TimeRange`] is half-open (`[start, end)`) and never crosses midnight.
//! Shops that close at midnight use `23:59` as their closing time.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{HoursError, Result};

/// A half-open `[start, end)` interval of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct TimeRange {
    #[serde(serialize_with = "hhmm::serialize")]
    start: NaiveTime,
    #[serde(serialize_with = "hhmm::serialize")]
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawRange {
    #[serde(deserialize_with = "hhmm::deserialize")]
    start: NaiveTime,
    #[serde(deserialize_with = "hhmm::deserialize")]
    end: NaiveTime,
}

impl TryFrom<RawRange> for TimeRange {
    type Error = HoursError;

    fn try_from(raw: RawRange) -> Result<Self> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Build a range, rejecting empty or inverted intervals.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(HoursError::InvalidRange(format!(
                "start {} is not before end {}",
                format_time(start),
                format_time(end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a range from two `HH:MM` or `HH:MM:SS` strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use shop_hours::TimeRange;
    ///
    /// let morning = TimeRange::parse("09:00", "12:30:00").unwrap();
    /// assert_eq!(morning.duration_minutes(), 210);
    /// assert!(TimeRange::parse("18:00", "09:00").is_err());
    /// ```
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration_minutes(&self) -> u32 {
        (secs(self.end) - secs(self.start)) / 60
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }

    /// Whether a slot of `minutes` starting at `start` fits entirely in this range.
    pub fn covers(&self, start: NaiveTime, minutes: u32) -> bool {
        let slot_start = secs(start);
        let slot_end = slot_start.saturating_add(minutes.saturating_mul(60));
        slot_start >= secs(self.start) && slot_end <= secs(self.end)
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_time(self.start), format_time(self.end))
    }
}

/// Parse a wall-clock time: `"09:30"`, `"09:30:00"` or `"09:30:00.5"`.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|e| HoursError::InvalidTime(format!("'{}': {}", s, e)))
}

/// `HH:MM`, widened to `HH:MM:SS[.f]` only when the time carries seconds.
pub(crate) fn format_time(t: NaiveTime) -> String {
    if t.nanosecond() != 0 {
        t.format("%H:%M:%S%.f").to_string()
    } else if t.second() != 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        t.format("%H:%M").to_string()
    }
}

/// Seconds since midnight.
pub(crate) fn secs(t: NaiveTime) -> u32 {
    t.num_seconds_from_midnight()
}

/// Serde adapter writing times with [`format_time`] and reading anything
/// [`parse_time`] accepts.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_time(&s).map_err(serde::de::Error::custom)
    }
}
