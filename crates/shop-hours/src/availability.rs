//! Daily shop hours and bookable slots.
//!
//! [`ShopHours`] resolves the hours a shop keeps on a date by layering, in
//! decreasing precedence:
//!
//! 1. an extra opening for that date (wins even on holidays),
//! 2. an exceptional closure for that date,
//! 3. a national holiday, when the shop closes on holidays,
//! 4. the weekly template.
//!
//! On top of the resolved [`DailyHours`] it provides the availability
//! predicate ([`ShopHours::is_slot_available`]) and the quantized slot
//! generator ([`ShopHours::generate_slots`]). All functions are pure: the
//! caller supplies "now" and the busy blocks.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{HoursError, Result};
use crate::holidays::HolidayCalendar;
use crate::overrides::{DateOverride, OverrideSet};
use crate::schedule::WeeklySchedule;
use crate::time_range::{secs, TimeRange};

/// Longest window [`ShopHours::hours_between`] will expand.
pub const MAX_WINDOW_DAYS: i64 = 366;

const SECONDS_PER_DAY: u32 = 86_400;

// ── Resolved hours ──────────────────────────────────────────────────────────

/// Why a date has the hours it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HoursSource {
    /// Taken from the weekly template.
    Regular,
    /// Taken from a one-off extra opening.
    ExtraOpening,
    /// Closed for a national holiday.
    Holiday { name: String },
    /// Closed by an exceptional closure.
    Closure { reason: Option<String> },
    /// The template has the weekday closed.
    Closed,
}

/// The hours a shop keeps on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyHours {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub ranges: Vec<TimeRange>,
    pub source: HoursSource,
}

impl DailyHours {
    fn new(date: NaiveDate, ranges: Vec<TimeRange>, source: HoursSource) -> Self {
        Self {
            date,
            weekday: date.weekday(),
            ranges,
            source,
        }
    }

    fn closed(date: NaiveDate, source: HoursSource) -> Self {
        Self::new(date, Vec::new(), source)
    }

    pub fn is_open(&self) -> bool {
        !self.ranges.is_empty()
    }

    pub fn is_open_at(&self, t: NaiveTime) -> bool {
        self.ranges.iter().any(|r| r.contains(t))
    }

    /// Total open minutes in the day.
    pub fn open_minutes(&self) -> u32 {
        self.ranges.iter().map(TimeRange::duration_minutes).sum()
    }
}

// ── Busy time ───────────────────────────────────────────────────────────────

/// A half-open interval during which a slot cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyBlock {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BusyBlock {
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && start < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

/// The transient copy of a backend appointment needed to block time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    #[serde(default)]
    pub staff_id: Option<String>,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn blocks_time(&self) -> bool {
        self.status != AppointmentStatus::Cancelled && self.duration_minutes > 0
    }
}

/// Busy blocks from appointments. With `staff_id`, only that staff member's
/// appointments and unassigned ones block; cancelled appointments never do.
pub fn busy_blocks(appointments: &[Appointment], staff_id: Option<&str>) -> Vec<BusyBlock> {
    let mut blocks: Vec<BusyBlock> = appointments
        .iter()
        .filter(|a| a.blocks_time())
        .filter(|a| match (staff_id, a.staff_id.as_deref()) {
            (Some(wanted), Some(assigned)) => wanted == assigned,
            _ => true,
        })
        .map(|a| BusyBlock {
            start: a.start,
            end: a.end(),
        })
        .collect();
    blocks.sort_by_key(|b| b.start);
    blocks
}

// ── Engine ──────────────────────────────────────────────────────────────────

/// Tunables for hours resolution and slot generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopHoursOptions {
    /// Close automatically on national holidays.
    pub close_on_holidays: bool,
    /// Slot grid, in minutes since midnight.
    pub slot_step_minutes: u32,
    /// Minimum delay between "now" and the start of a bookable slot.
    pub min_lead_minutes: u32,
}

impl Default for ShopHoursOptions {
    fn default() -> Self {
        Self {
            close_on_holidays: true,
            slot_step_minutes: 15,
            min_lead_minutes: 0,
        }
    }
}

/// A bookable slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// The availability engine for one shop.
#[derive(Debug, Clone)]
pub struct ShopHours {
    schedule: WeeklySchedule,
    overrides: OverrideSet,
    calendar: HolidayCalendar,
    options: ShopHoursOptions,
}

impl ShopHours {
    /// Build an engine.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::InvalidSchedule`] if the template has unsorted or
    /// overlapping ranges, or [`HoursError::InvalidDuration`] if the slot step
    /// is zero or does not divide a day.
    pub fn new(
        schedule: WeeklySchedule,
        overrides: OverrideSet,
        calendar: HolidayCalendar,
        options: ShopHoursOptions,
    ) -> Result<Self> {
        schedule.validate()?;
        validate_step(options.slot_step_minutes)?;
        Ok(Self {
            schedule,
            overrides,
            calendar,
            options,
        })
    }

    pub fn schedule(&self) -> &WeeklySchedule {
        &self.schedule
    }

    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    pub fn options(&self) -> &ShopHoursOptions {
        &self.options
    }

    /// Resolve the hours for `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{NaiveDate, Weekday};
    /// use shop_hours::{
    ///     DayHours, HolidayCalendar, HoursSource, OverrideSet, ShopHours, ShopHoursOptions,
    ///     TimeRange, WeeklySchedule,
    /// };
    ///
    /// let mut week = WeeklySchedule::closed();
    /// week.set_day(Weekday::Thu, DayHours::open(vec![TimeRange::parse("09:00", "19:00").unwrap()]).unwrap());
    /// let shop = ShopHours::new(week, OverrideSet::new(), HolidayCalendar::france(), ShopHoursOptions::default()).unwrap();
    ///
    /// // Ascension Thursday 2026
    /// let hours = shop.hours_for(NaiveDate::from_ymd_opt(2026, 5, 14).unwrap());
    /// assert!(!hours.is_open());
    /// assert!(matches!(hours.source, HoursSource::Holiday { .. }));
    /// ```
    pub fn hours_for(&self, date: NaiveDate) -> DailyHours {
        match self.overrides.get(date) {
            Some(DateOverride::ExtraOpening { ranges, .. }) => {
                return DailyHours::new(date, ranges.clone(), HoursSource::ExtraOpening);
            }
            Some(DateOverride::Closure { reason, .. }) => {
                return DailyHours::closed(
                    date,
                    HoursSource::Closure {
                        reason: reason.clone(),
                    },
                );
            }
            None => {}
        }

        if self.options.close_on_holidays {
            if let Some(holiday) = self.calendar.holiday_on(date) {
                return DailyHours::closed(date, HoursSource::Holiday { name: holiday.name });
            }
        }

        let ranges = self.schedule.day(date.weekday()).effective_ranges();
        if ranges.is_empty() {
            DailyHours::closed(date, HoursSource::Closed)
        } else {
            DailyHours::new(date, ranges.to_vec(), HoursSource::Regular)
        }
    }

    /// Resolve every date in `from..=to`.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::InvalidDate`] if `from > to` or the window is
    /// longer than [`MAX_WINDOW_DAYS`].
    pub fn hours_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyHours>> {
        if from > to {
            return Err(HoursError::InvalidDate(format!(
                "window start {from} is after end {to}"
            )));
        }
        let span = (to - from).num_days() + 1;
        if span > MAX_WINDOW_DAYS {
            return Err(HoursError::InvalidDate(format!(
                "window of {span} days exceeds {MAX_WINDOW_DAYS}"
            )));
        }
        Ok(from
            .iter_days()
            .take(span as usize)
            .map(|date| self.hours_for(date))
            .collect())
    }

    /// First open date in `from..from + horizon_days`.
    pub fn next_open_day(&self, from: NaiveDate, horizon_days: u32) -> Option<DailyHours> {
        from.iter_days()
            .take(horizon_days as usize)
            .map(|date| self.hours_for(date))
            .find(DailyHours::is_open)
    }

    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        self.hours_for(at.date()).is_open_at(at.time())
    }

    /// The availability predicate: the slot `[start, start + duration)` lies
    /// in one opening range, overlaps no busy block and starts no earlier
    /// than `now` plus the minimum lead time.
    pub fn is_slot_available(
        &self,
        start: NaiveDateTime,
        duration_minutes: u32,
        busy: &[BusyBlock],
        now: NaiveDateTime,
    ) -> bool {
        let hours = self.hours_for(start.date());
        self.slot_fits(&hours, start, duration_minutes, busy, self.earliest_start(now))
    }

    /// Quantized bookable slots on `date` for a service of `duration_minutes`.
    ///
    /// Within each opening range the first candidate is the range start
    /// rounded up to the slot grid; candidates then advance one step at a
    /// time and are kept when [`ShopHours::is_slot_available`] holds.
    ///
    /// # Errors
    ///
    /// Returns [`HoursError::InvalidDuration`] for a zero duration.
    pub fn generate_slots(
        &self,
        date: NaiveDate,
        duration_minutes: u32,
        busy: &[BusyBlock],
        now: NaiveDateTime,
    ) -> Result<Vec<Slot>> {
        if duration_minutes == 0 {
            return Err(HoursError::InvalidDuration(
                "service duration must be positive".to_string(),
            ));
        }

        let hours = self.hours_for(date);
        let earliest = self.earliest_start(now);
        let step = self.options.slot_step_minutes * 60;
        let length = duration_minutes.saturating_mul(60);

        let mut slots = Vec::new();
        for range in &hours.ranges {
            let mut candidate = round_up(secs(range.start()), step);
            while candidate.saturating_add(length) <= secs(range.end()) {
                let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt(candidate, 0)
                else {
                    break;
                };
                let start = date.and_time(time);
                if self.slot_fits(&hours, start, duration_minutes, busy, earliest) {
                    slots.push(Slot {
                        start,
                        end: start + Duration::minutes(i64::from(duration_minutes)),
                    });
                }
                candidate += step;
            }
        }
        Ok(slots)
    }

    fn earliest_start(&self, now: NaiveDateTime) -> NaiveDateTime {
        now + Duration::minutes(i64::from(self.options.min_lead_minutes))
    }

    fn slot_fits(
        &self,
        hours: &DailyHours,
        start: NaiveDateTime,
        duration_minutes: u32,
        busy: &[BusyBlock],
        earliest: NaiveDateTime,
    ) -> bool {
        if duration_minutes == 0 || start < earliest {
            return false;
        }
        if !hours
            .ranges
            .iter()
            .any(|r| r.covers(start.time(), duration_minutes))
        {
            return false;
        }
        let end = start + Duration::minutes(i64::from(duration_minutes));
        !busy.iter().any(|b| b.overlaps(start, end))
    }
}

fn validate_step(step_minutes: u32) -> Result<()> {
    if step_minutes == 0 || step_minutes > 1440 || SECONDS_PER_DAY % (step_minutes * 60) != 0 {
        return Err(HoursError::InvalidDuration(format!(
            "slot step of {step_minutes} minutes does not divide a day"
        )));
    }
    Ok(())
}

fn round_up(value: u32, step: u32) -> u32 {
    value.div_ceil(step) * step
}
