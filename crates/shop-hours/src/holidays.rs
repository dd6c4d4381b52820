//! National-holiday calendars.
//!
//! Holidays are computed, never stored: each calendar is a list of rules that
//! are either a fixed month/day or an offset from Easter Sunday. Easter is
//! derived with Gauss's algorithm for the Gregorian calendar.
//!
//! # Functions
//!
//! - [`easter_sunday`] — Easter Sunday of a Gregorian year
//! - [`HolidayCalendar::holidays_in`] — every holiday of a year, sorted
//! - [`HolidayCalendar::holiday_on`] — the holiday falling on a date, if any

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// First year of the Gregorian calendar in which Gauss's algorithm applies.
pub const FIRST_GREGORIAN_YEAR: i32 = 1583;

// ── easter_sunday ───────────────────────────────────────────────────────────

/// Compute Easter Sunday for `year` using Gauss's Easter algorithm.
///
/// Returns `None` outside `1583..=9999`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use shop_hours::easter_sunday;
///
/// assert_eq!(easter_sunday(2026), NaiveDate::from_ymd_opt(2026, 4, 5));
/// assert_eq!(easter_sunday(1500), None);
/// ```
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    if !(FIRST_GREGORIAN_YEAR..=9999).contains(&year) {
        return None;
    }

    let a = year % 19;
    let b = year % 4;
    let c = year % 7;
    let k = year / 100;
    let p = (13 + 8 * k) / 25;
    let q = k / 4;
    let m = (15 - p + k - q).rem_euclid(30);
    let n = (4 + k - q).rem_euclid(7);
    let d = (19 * a + m) % 30;
    let e = (2 * b + 4 * c + 6 * d + n) % 7;

    // Gauss's two exceptions: April 26 becomes April 19, and April 25 becomes
    // April 18 when the Golden Number is above 11.
    if d == 29 && e == 6 {
        return NaiveDate::from_ymd_opt(year, 4, 19);
    }
    if d == 28 && e == 6 && (11 * m + 11) % 30 < 19 {
        return NaiveDate::from_ymd_opt(year, 4, 18);
    }

    let march_day = 22 + d + e;
    if march_day <= 31 {
        NaiveDate::from_ymd_opt(year, 3, march_day as u32)
    } else {
        NaiveDate::from_ymd_opt(year, 4, (march_day - 31) as u32)
    }
}

// ── Rules and calendars ─────────────────────────────────────────────────────

/// How a holiday's date is derived for a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HolidayRule {
    /// Same month and day every year.
    Fixed { month: u32, day: u32 },
    /// Days after (or before, if negative) Easter Sunday.
    EasterOffset { days: i64 },
}

impl HolidayRule {
    /// The rule's date in `year`, or `None` when that date does not exist.
    pub fn date_in(&self, year: i32) -> Option<NaiveDate> {
        match *self {
            HolidayRule::Fixed { month, day } => NaiveDate::from_ymd_opt(year, month, day),
            HolidayRule::EasterOffset { days } => {
                let offset = Duration::try_days(days)?;
                easter_sunday(year)?.checked_add_signed(offset)
            }
        }
    }
}

/// A concrete holiday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

/// Which built-in calendar a shop follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarKind {
    #[default]
    France,
    None,
}

impl CalendarKind {
    pub fn calendar(self) -> HolidayCalendar {
        match self {
            CalendarKind::France => HolidayCalendar::france(),
            CalendarKind::None => HolidayCalendar::none(),
        }
    }
}

impl std::str::FromStr for CalendarKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "france" | "fr" => Ok(CalendarKind::France),
            "none" => Ok(CalendarKind::None),
            other => Err(format!("unknown holiday calendar '{other}'")),
        }
    }
}

/// A named set of holiday rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    pub name: String,
    rules: Vec<(String, HolidayRule)>,
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::france()
    }
}

impl HolidayCalendar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, name: impl Into<String>, rule: HolidayRule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    /// An empty calendar: no day is ever a holiday.
    pub fn none() -> Self {
        Self::new("none")
    }

    /// The eleven French public holidays (jours fériés).
    pub fn france() -> Self {
        use HolidayRule::{EasterOffset, Fixed};

        Self::new("france")
            .with_rule("Jour de l'an", Fixed { month: 1, day: 1 })
            .with_rule("Lundi de Pâques", EasterOffset { days: 1 })
            .with_rule("Fête du Travail", Fixed { month: 5, day: 1 })
            .with_rule("Victoire 1945", Fixed { month: 5, day: 8 })
            .with_rule("Ascension", EasterOffset { days: 39 })
            .with_rule("Lundi de Pentecôte", EasterOffset { days: 50 })
            .with_rule("Fête nationale", Fixed { month: 7, day: 14 })
            .with_rule("Assomption", Fixed { month: 8, day: 15 })
            .with_rule("Toussaint", Fixed { month: 11, day: 1 })
            .with_rule("Armistice 1918", Fixed { month: 11, day: 11 })
            .with_rule("Noël", Fixed { month: 12, day: 25 })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every holiday in `year`, sorted by date. Rules that do not resolve for
    /// that year (e.g. Easter outside the Gregorian range) are skipped.
    pub fn holidays_in(&self, year: i32) -> Vec<Holiday> {
        let mut out: Vec<Holiday> = self
            .rules
            .iter()
            .filter_map(|(name, rule)| {
                rule.date_in(year).map(|date| Holiday {
                    date,
                    name: name.clone(),
                })
            })
            .collect();
        out.sort_by_key(|h| h.date);
        out
    }

    /// The holiday falling on `date`, if any.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<Holiday> {
        self.rules.iter().find_map(|(name, rule)| {
            // Easter offsets are assumed to stay within Easter's own year.
            (rule.date_in(date.year()) == Some(date)).then(|| Holiday {
                date,
                name: name.clone(),
            })
        })
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_on(date).is_some()
    }
}
