//! One-off exceptions to the weekly template.
//!
//! An extra opening opens the shop on a specific date with at most two
//! ranges (a morning and an afternoon). A closure shuts it for the day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{HoursError, Result};
use crate::schedule::check_disjoint;
use crate::time_range::TimeRange;

/// Maximum number of ranges an extra opening may declare.
pub const MAX_EXTRA_RANGES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateOverride {
    ExtraOpening {
        date: NaiveDate,
        ranges: Vec<TimeRange>,
    },
    Closure {
        date: NaiveDate,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl DateOverride {
    /// An extra opening with one or two disjoint ranges.
    pub fn extra_opening(date: NaiveDate, ranges: Vec<TimeRange>) -> Result<Self> {
        let mut o = Self::ExtraOpening { date, ranges };
        o.normalize();
        o.validate()?;
        Ok(o)
    }

    pub fn closure(date: NaiveDate, reason: Option<String>) -> Self {
        Self::Closure { date, reason }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Self::ExtraOpening { date, .. } | Self::Closure { date, .. } => *date,
        }
    }

    /// Sort an extra opening's ranges by start time.
    fn normalize(&mut self) {
        if let Self::ExtraOpening { ranges, .. } = self {
            ranges.sort();
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ExtraOpening { date, ranges } => {
                if ranges.is_empty() || ranges.len() > MAX_EXTRA_RANGES {
                    return Err(HoursError::InvalidOverride(format!(
                        "extra opening on {date} needs 1 to {MAX_EXTRA_RANGES} ranges, got {}",
                        ranges.len()
                    )));
                }
                let mut sorted = ranges.clone();
                sorted.sort();
                check_disjoint(&sorted)
                    .map_err(|e| HoursError::InvalidOverride(format!("{date}: {e}")))
            }
            Self::Closure { .. } => Ok(()),
        }
    }
}

/// Overrides keyed by date; at most one per date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DateOverride>", into = "Vec<DateOverride>")]
pub struct OverrideSet {
    by_date: BTreeMap<NaiveDate, DateOverride>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an override, replacing any previous one for the same date.
    /// Extra-opening ranges are stored sorted. Returns the replaced override.
    pub fn insert(&mut self, mut o: DateOverride) -> Result<Option<DateOverride>> {
        o.normalize();
        o.validate()?;
        Ok(self.by_date.insert(o.date(), o))
    }

    pub fn remove(&mut self, date: NaiveDate) -> Option<DateOverride> {
        self.by_date.remove(&date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DateOverride> {
        self.by_date.get(&date)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateOverride> {
        self.by_date.values()
    }

    /// Drop overrides dated before `today`.
    pub fn prune_before(&mut self, today: NaiveDate) {
        self.by_date = self.by_date.split_off(&today);
    }
}

impl TryFrom<Vec<DateOverride>> for OverrideSet {
    type Error = HoursError;

    fn try_from(list: Vec<DateOverride>) -> Result<Self> {
        let mut set = Self::new();
        for o in list {
            set.insert(o)?;
        }
        Ok(set)
    }
}

impl From<OverrideSet> for Vec<DateOverride> {
    fn from(set: OverrideSet) -> Self {
        set.by_date.into_values().collect()
    }
}
