//! Matching freed slots against the waitlist.
//!
//! When an appointment is cancelled the gap it leaves is offered to clients
//! waiting for that date, first come first served.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::time_range::TimeRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: String,
    pub client_id: String,
    pub date: NaiveDate,
    /// Preferred time of day; `None` accepts any time.
    #[serde(default)]
    pub window: Option<TimeRange>,
    pub duration_minutes: u32,
    pub created_at: NaiveDateTime,
}

impl WaitlistEntry {
    fn accepts(&self, date: NaiveDate, start: NaiveTime, free_minutes: u32) -> bool {
        if self.date != date || self.duration_minutes == 0 || self.duration_minutes > free_minutes
        {
            return false;
        }
        self.window
            .is_none_or(|w| w.covers(start, self.duration_minutes))
    }
}

/// Entries that can take a gap of `free_minutes` starting at `start` on
/// `date`, oldest request first (ties broken by id).
pub fn match_freed_slot<'a>(
    entries: &'a [WaitlistEntry],
    date: NaiveDate,
    start: NaiveTime,
    free_minutes: u32,
) -> Vec<&'a WaitlistEntry> {
    let mut matches: Vec<&WaitlistEntry> = entries
        .iter()
        .filter(|e| e.accepts(date, start, free_minutes))
        .collect();
    matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    matches
}
