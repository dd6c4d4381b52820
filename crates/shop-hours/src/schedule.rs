//! Recurring weekly opening-hours template.
//!
//! The backend stores one row per weekday (`0 = Sunday … 6 = Saturday`) with
//! an opening window and an optional lunch break. [`WeeklySchedule::from_rows`]
//! turns those rows into a list of [`TimeRange`]s per day.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{HoursError, Result};
use crate::time_range::{parse_time, TimeRange};

/// Hours for one weekday of the template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub is_open: bool,
    #[serde(default)]
    pub ranges: Vec<TimeRange>,
}

impl DayHours {
    pub fn closed() -> Self {
        Self::default()
    }

    /// An open day. Ranges are sorted; overlapping ranges are rejected.
    pub fn open(mut ranges: Vec<TimeRange>) -> Result<Self> {
        ranges.sort();
        check_disjoint(&ranges)?;
        Ok(Self {
            is_open: true,
            ranges,
        })
    }

    /// Ranges that actually apply: none when the day is flagged closed.
    pub fn effective_ranges(&self) -> &[TimeRange] {
        if self.is_open {
            &self.ranges
        } else {
            &[]
        }
    }
}

/// One opening-hours row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHoursRow {
    /// 0 = Sunday … 6 = Saturday.
    pub day_of_week: u8,
    pub is_open: bool,
    #[serde(default)]
    pub open_time: Option<String>,
    #[serde(default)]
    pub close_time: Option<String>,
    #[serde(default)]
    pub break_start: Option<String>,
    #[serde(default)]
    pub break_end: Option<String>,
}

impl OpeningHoursRow {
    fn weekday(&self) -> Result<Weekday> {
        weekday_from_sunday_index(self.day_of_week)
    }

    fn to_day_hours(&self) -> Result<DayHours> {
        if !self.is_open {
            return Ok(DayHours::closed());
        }

        let day = self.day_of_week;
        let (open, close) = match (&self.open_time, &self.close_time) {
            (Some(o), Some(c)) => (parse_time(o)?, parse_time(c)?),
            _ => {
                return Err(HoursError::InvalidSchedule(format!(
                    "open day {day} is missing an opening or closing time"
                )))
            }
        };
        let window = TimeRange::new(open, close)?;

        match (&self.break_start, &self.break_end) {
            (None, None) => DayHours::open(vec![window]),
            (Some(bs), Some(be)) => {
                let (bs, be) = (parse_time(bs)?, parse_time(be)?);
                if !(open < bs && bs < be && be < close) {
                    return Err(HoursError::InvalidSchedule(format!(
                        "break on day {day} must lie strictly inside {window}"
                    )));
                }
                DayHours::open(vec![TimeRange::new(open, bs)?, TimeRange::new(be, close)?])
            }
            _ => Err(HoursError::InvalidSchedule(format!(
                "break on day {day} needs both a start and an end"
            ))),
        }
    }
}

/// Seven [`DayHours`], Monday first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    days: [DayHours; 7],
}

impl WeeklySchedule {
    /// A template with every day closed.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Build the template from backend rows. Days without a row are closed;
    /// when a weekday appears twice the later row wins.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::InvalidSchedule`] for an out-of-range weekday,
    /// a missing time on an open day, or a break outside the opening window,
    /// and [`HoursError::InvalidTime`] / [`HoursError::InvalidRange`] for
    /// unparseable or inverted times.
    pub fn from_rows(rows: &[OpeningHoursRow]) -> Result<Self> {
        let mut schedule = Self::closed();
        for row in rows {
            let weekday = row.weekday()?;
            schedule.set_day(weekday, row.to_day_hours()?);
        }
        Ok(schedule)
    }

    pub fn day(&self, weekday: Weekday) -> &DayHours {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn set_day(&mut self, weekday: Weekday, hours: DayHours) {
        self.days[weekday.num_days_from_monday() as usize] = hours;
    }

    pub fn is_open_on(&self, weekday: Weekday) -> bool {
        !self.day(weekday).effective_ranges().is_empty()
    }

    /// Check every day's ranges are sorted and disjoint. Templates built
    /// through [`DayHours::open`] always pass; this guards deserialized data.
    pub fn validate(&self) -> Result<()> {
        for day in &self.days {
            if day.ranges.windows(2).any(|w| w[0] > w[1]) {
                return Err(HoursError::InvalidSchedule(
                    "ranges are not sorted by start time".to_string(),
                ));
            }
            check_disjoint(&day.ranges)?;
        }
        Ok(())
    }
}

/// Map the backend's Sunday-based index to a [`Weekday`].
pub fn weekday_from_sunday_index(index: u8) -> Result<Weekday> {
    match index {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        _ => Err(HoursError::InvalidSchedule(format!(
            "day_of_week must be 0-6, got {index}"
        ))),
    }
}

/// Sorted ranges must not overlap.
pub(crate) fn check_disjoint(sorted: &[TimeRange]) -> Result<()> {
    if let Some(w) = sorted.windows(2).find(|w| w[0].overlaps(&w[1])) {
        return Err(HoursError::InvalidSchedule(format!(
            "ranges {} and {} overlap",
            w[0], w[1]
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(day: u8, open: &str, close: &str) -> OpeningHoursRow {
        OpeningHoursRow {
            day_of_week: day,
            is_open: true,
            open_time: Some(open.to_string()),
            close_time: Some(close.to_string()),
            break_start: None,
            break_end: None,
        }
    }

    #[test]
    fn test_from_rows_maps_sunday_index() {
        let schedule = WeeklySchedule::from_rows(&[row(0, "10:00", "13:00")]).unwrap();
        assert!(schedule.is_open_on(Weekday::Sun));
        assert!(!schedule.is_open_on(Weekday::Mon));
    }

    #[test]
    fn test_from_rows_splits_break() {
        let mut r = row(2, "09:00:00", "19:00:00");
        r.break_start = Some("12:00:00".to_string());
        r.break_end = Some("14:00:00".to_string());
        let schedule = WeeklySchedule::from_rows(&[r]).unwrap();
        let ranges = schedule.day(Weekday::Tue).effective_ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], TimeRange::parse("09:00", "12:00").unwrap());
        assert_eq!(ranges[1], TimeRange::parse("14:00", "19:00").unwrap());
    }

    #[test]
    fn test_from_rows_rejects_break_outside_window() {
        let mut r = row(2, "09:00", "12:00");
        r.break_start = Some("11:00".to_string());
        r.break_end = Some("13:00".to_string());
        let err = WeeklySchedule::from_rows(&[r]).unwrap_err();
        assert!(matches!(err, HoursError::InvalidSchedule(_)));
    }

    #[test]
    fn test_from_rows_rejects_half_break() {
        let mut r = row(3, "09:00", "18:00");
        r.break_start = Some("12:00".to_string());
        assert!(WeeklySchedule::from_rows(&[r]).is_err());
    }

    #[test]
    fn test_from_rows_rejects_bad_weekday() {
        let err = WeeklySchedule::from_rows(&[row(7, "09:00", "18:00")]).unwrap_err();
        assert!(err.to_string().contains("0-6"));
    }

    #[test]
    fn test_from_rows_open_day_without_times() {
        let r = OpeningHoursRow {
            day_of_week: 1,
            is_open: true,
            open_time: None,
            close_time: Some("18:00".to_string()),
            break_start: None,
            break_end: None,
        };
        assert!(WeeklySchedule::from_rows(&[r]).is_err());
    }

    #[test]
    fn test_closed_row_ignores_times() {
        let mut r = row(1, "18:00", "09:00");
        r.is_open = false;
        let schedule = WeeklySchedule::from_rows(&[r]).unwrap();
        assert!(!schedule.is_open_on(Weekday::Mon));
    }

    #[test]
    fn test_later_row_wins() {
        let schedule =
            WeeklySchedule::from_rows(&[row(5, "09:00", "12:00"), row(5, "10:00", "20:00")])
                .unwrap();
        assert_eq!(
            schedule.day(Weekday::Fri).effective_ranges(),
            &[TimeRange::parse("10:00", "20:00").unwrap()]
        );
    }

    #[test]
    fn test_day_hours_open_sorts_and_rejects_overlap() {
        let pm = TimeRange::parse("14:00", "18:00").unwrap();
        let am = TimeRange::parse("09:00", "12:00").unwrap();
        let day = DayHours::open(vec![pm, am]).unwrap();
        assert_eq!(day.ranges, vec![am, pm]);

        let clash = TimeRange::parse("11:00", "15:00").unwrap();
        assert!(DayHours::open(vec![am, clash]).is_err());
    }

    #[test]
    fn test_flagged_closed_day_has_no_effective_ranges() {
        let day = DayHours {
            is_open: false,
            ranges: vec![TimeRange::parse("09:00", "12:00").unwrap()],
        };
        assert!(day.effective_ranges().is_empty());
    }

    #[test]
    fn test_validate_catches_deserialized_overlap() {
        let mut schedule = WeeklySchedule::closed();
        schedule.set_day(
            Weekday::Mon,
            DayHours {
                is_open: true,
                ranges: vec![
                    TimeRange::parse("09:00", "13:00").unwrap(),
                    TimeRange::parse("12:00", "18:00").unwrap(),
                ],
            },
        );
        assert!(schedule.validate().is_err());
        assert!(WeeklySchedule::closed().validate().is_ok());
    }
}
