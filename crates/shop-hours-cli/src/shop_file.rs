//! The JSON shop description read by every subcommand.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use shop_hours::{
    Appointment, CalendarKind, OpeningHoursRow, OverrideSet, ShopHours, ShopHoursOptions,
    ShopSnapshot, WeeklySchedule,
};

#[derive(Debug, Deserialize)]
pub struct ShopFile {
    #[serde(default = "default_shop_id")]
    pub shop_id: String,
    /// IANA timezone used to derive the shop-local "now".
    #[serde(default)]
    pub timezone: Option<String>,
    pub weekly: Vec<OpeningHoursRow>,
    #[serde(default)]
    pub overrides: OverrideSet,
    #[serde(default)]
    pub calendar: CalendarKind,
    #[serde(default)]
    pub options: ShopHoursOptions,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

fn default_shop_id() -> String {
    "default".to_string()
}

impl ShopFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read shop file {}", path.display()))?;
        let file: ShopFile = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse shop file {}", path.display()))?;
        file.timezone()
            .with_context(|| format!("invalid shop file {}", path.display()))?;
        tracing::debug!(shop_id = %file.shop_id, rows = file.weekly.len(), "loaded shop file");
        Ok(file)
    }

    /// The shop's IANA timezone, if one is set.
    pub fn timezone(&self) -> Result<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| anyhow::anyhow!("invalid timezone '{name}'"))
            })
            .transpose()
    }

    pub fn snapshot(&self) -> Result<ShopSnapshot> {
        let schedule =
            WeeklySchedule::from_rows(&self.weekly).context("invalid weekly opening hours")?;
        Ok(ShopSnapshot {
            shop_id: self.shop_id.clone(),
            schedule,
            overrides: self.overrides.clone(),
            calendar: self.calendar,
            options: self.options.clone(),
        })
    }

    pub fn engine(&self) -> Result<ShopHours> {
        Ok(self.snapshot()?.to_engine()?)
    }

    /// Current wall-clock time in the shop's timezone (UTC when unset).
    pub fn local_now(&self) -> Result<NaiveDateTime> {
        let now = Utc::now();
        Ok(match self.timezone()? {
            Some(tz) => now.with_timezone(&tz).naive_local(),
            None => now.naive_utc(),
        })
    }
}
