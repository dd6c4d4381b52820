//! # shop-hours
//!
//! Deterministic opening-hours computation for barbershop booking.
//!
//! The engine merges a recurring weekly template, one-off date overrides and
//! a national-holiday calendar into the hours a shop actually keeps on a
//! given day, then projects quantized bookable slots out of those hours.
//! Every function takes its "now" explicitly; nothing reads the system clock.
//!
//! ## Modules
//!
//! - [`time_range`] — `HH:MM` opening ranges within a single day
//! - [`schedule`] — weekly template, built from backend opening-hours rows
//! - [`overrides`] — extra openings and exceptional closures on single dates
//! - [`holidays`] — holiday calendars (fixed dates plus Gauss Easter)
//! - [`availability`] — daily hours resolution, availability predicate, slot generation
//! - [`duration`] — hair-profile-driven service duration estimates
//! - [`waitlist`] — matching freed slots against waiting clients
//! - [`cache`] — client-side snapshot cache reconciled against the backend
//! - [`error`] — Error types

pub mod availability;
pub mod cache;
pub mod duration;
pub mod error;
pub mod holidays;
pub mod overrides;
pub mod schedule;
pub mod time_range;
pub mod waitlist;

pub use availability::{
    busy_blocks, Appointment, AppointmentStatus, BusyBlock, DailyHours, HoursSource, ShopHours,
    ShopHoursOptions, Slot,
};
pub use cache::{CacheEntry, HoursBackend, HoursCache, LoadOutcome, ShopSnapshot};
pub use duration::{
    estimate_duration, estimate_total, HairLength, HairProfile, HairTexture, HairThickness,
    Service, ServiceKind,
};
pub use error::HoursError;
pub use holidays::{easter_sunday, CalendarKind, Holiday, HolidayCalendar, HolidayRule};
pub use overrides::{DateOverride, OverrideSet};
pub use schedule::{DayHours, OpeningHoursRow, WeeklySchedule};
pub use time_range::TimeRange;
pub use waitlist::{match_freed_slot, WaitlistEntry};
