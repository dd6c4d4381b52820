//! Client-side cache of shop hours, reconciled against the backend.
//!
//! The backend is the source of truth; the cache holds non-authoritative
//! copies so that availability can be computed without a round trip. A load
//! serves a fresh copy when it has one, otherwise fetches, replaces the local
//! copy and reports whether it changed. When the fetch fails the stale copy
//! is served and the next load tries again.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::availability::{ShopHours, ShopHoursOptions};
use crate::error::{HoursError, Result};
use crate::holidays::CalendarKind;
use crate::overrides::OverrideSet;
use crate::schedule::WeeklySchedule;

/// Everything the engine needs about one shop, as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSnapshot {
    pub shop_id: String,
    pub schedule: WeeklySchedule,
    #[serde(default)]
    pub overrides: OverrideSet,
    #[serde(default)]
    pub calendar: CalendarKind,
    #[serde(default)]
    pub options: ShopHoursOptions,
}

impl ShopSnapshot {
    pub fn to_engine(&self) -> Result<ShopHours> {
        ShopHours::new(
            self.schedule.clone(),
            self.overrides.clone(),
            self.calendar.calendar(),
            self.options.clone(),
        )
    }
}

/// The remote source of truth for shop hours.
pub trait HoursBackend {
    fn fetch(&mut self, shop_id: &str) -> Result<ShopSnapshot>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub snapshot: ShopSnapshot,
    pub fetched_at: DateTime<Utc>,
}

/// How a [`HoursCache::load`] was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fresh cached copy was served.
    Cached,
    /// The backend was queried; `changed` tells whether the copy differed.
    Fetched { changed: bool },
    /// The backend failed and an expired copy was served.
    Stale { error: HoursError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoursCache {
    ttl_seconds: i64,
    entries: BTreeMap<String, CacheEntry>,
}

impl HoursCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_seconds: ttl.num_seconds(),
            entries: BTreeMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_seconds)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let age = now - entry.fetched_at;
        age >= Duration::zero() && age < self.ttl()
    }

    /// The cached snapshot for `shop_id`, only if it has not expired.
    pub fn get(&self, shop_id: &str, now: DateTime<Utc>) -> Option<&ShopSnapshot> {
        self.entries
            .get(shop_id)
            .filter(|e| self.is_fresh(e, now))
            .map(|e| &e.snapshot)
    }

    /// The cached entry for `shop_id`, fresh or not.
    pub fn entry(&self, shop_id: &str) -> Option<&CacheEntry> {
        self.entries.get(shop_id)
    }

    /// Serve `shop_id` from cache, fetching from `backend` when expired.
    ///
    /// # Errors
    ///
    /// Returns the backend's error when the fetch fails and nothing is
    /// cached for the shop. A snapshot for a different shop counts as a
    /// failed fetch.
    pub fn load<B: HoursBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        shop_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(ShopSnapshot, LoadOutcome)> {
        if let Some(snapshot) = self.get(shop_id, now) {
            debug!(shop_id, "hours cache hit");
            return Ok((snapshot.clone(), LoadOutcome::Cached));
        }

        let fetched = backend.fetch(shop_id).and_then(|remote| {
            if remote.shop_id == shop_id {
                Ok(remote)
            } else {
                Err(HoursError::Backend(format!(
                    "asked for shop '{shop_id}', backend answered for '{}'",
                    remote.shop_id
                )))
            }
        });
        match fetched {
            Ok(remote) => {
                debug!(shop_id, "fetched hours from backend");
                let changed = self.reconcile(remote.clone(), now);
                Ok((remote, LoadOutcome::Fetched { changed }))
            }
            Err(error) => match self.entries.get(shop_id) {
                Some(entry) => {
                    warn!(shop_id, %error, "backend fetch failed, serving stale hours");
                    Ok((entry.snapshot.clone(), LoadOutcome::Stale { error }))
                }
                None => Err(error),
            },
        }
    }

    /// Replace the local copy with `remote`. Returns whether it differed
    /// from what was cached (a first copy counts as a change).
    pub fn reconcile(&mut self, remote: ShopSnapshot, now: DateTime<Utc>) -> bool {
        let shop_id = remote.shop_id.clone();
        let changed = self
            .entries
            .get(&shop_id)
            .is_none_or(|local| local.snapshot != remote);
        if changed {
            info!(shop_id = %shop_id, "shop hours changed upstream");
        }
        self.entries.insert(
            shop_id,
            CacheEntry {
                snapshot: remote,
                fetched_at: now,
            },
        );
        changed
    }

    pub fn invalidate(&mut self, shop_id: &str) -> Option<CacheEntry> {
        self.entries.remove(shop_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize for local storage.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| HoursError::Cache(e.to_string()))
    }

    /// Restore from local storage. Snapshots that can no longer build a
    /// [`ShopHours`] are dropped rather than failing the whole cache.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut cache: Self =
            serde_json::from_str(json).map_err(|e| HoursError::Cache(e.to_string()))?;
        cache.entries.retain(|shop_id, entry| {
            let valid = entry.snapshot.to_engine().is_ok();
            if !valid {
                warn!(shop_id = %shop_id, "dropping invalid cached hours");
            }
            valid
        });
        Ok(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::DayHours;
    use crate::time_range::TimeRange;
    use chrono::{TimeZone, Weekday};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()
    }

    fn snapshot(close: &str) -> ShopSnapshot {
        let mut schedule = WeeklySchedule::closed();
        schedule.set_day(
            Weekday::Tue,
            DayHours::open(vec![TimeRange::parse("09:00", close).unwrap()]).unwrap(),
        );
        ShopSnapshot {
            shop_id: "shop-1".to_string(),
            schedule,
            overrides: OverrideSet::new(),
            calendar: CalendarKind::France,
            options: ShopHoursOptions::default(),
        }
    }

    /// Serves a queue of responses, counting calls.
    struct ScriptedBackend {
        responses: Vec<Result<ShopSnapshot>>,
        calls: usize,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<ShopSnapshot>>) -> Self {
            Self {
                responses,
                calls: 0,
            }
        }
    }

    impl HoursBackend for ScriptedBackend {
        fn fetch(&mut self, _shop_id: &str) -> Result<ShopSnapshot> {
            self.calls += 1;
            if self.responses.is_empty() {
                return Err(HoursError::Backend("no scripted response".to_string()));
            }
            self.responses.remove(0)
        }
    }

    fn cache() -> HoursCache {
        HoursCache::new(Duration::minutes(10))
    }

    #[test]
    fn test_first_load_fetches() {
        let mut c = cache();
        let mut backend = ScriptedBackend::new(vec![Ok(snapshot("18:00"))]);
        let (snap, outcome) = c.load(&mut backend, "shop-1", now()).unwrap();
        assert_eq!(outcome, LoadOutcome::Fetched { changed: true });
        assert_eq!(snap, snapshot("18:00"));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_fresh_entry_is_served_without_fetch() {
        let mut c = cache();
        let mut backend = ScriptedBackend::new(vec![Ok(snapshot("18:00"))]);
        c.load(&mut backend, "shop-1", now()).unwrap();
        let (_, outcome) = c
            .load(&mut backend, "shop-1", now() + Duration::minutes(5))
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Cached);
        assert_eq!(backend.calls, 1);
    }

    #[test]
    fn test_expired_entry_is_reconciled() {
        let mut c = cache();
        let mut backend = ScriptedBackend::new(vec![
            Ok(snapshot("18:00")),
            Ok(snapshot("18:00")),
            Ok(snapshot("19:00")),
        ]);
        c.load(&mut backend, "shop-1", now()).unwrap();

        let later = now() + Duration::minutes(10);
        let (_, outcome) = c.load(&mut backend, "shop-1", later).unwrap();
        assert_eq!(outcome, LoadOutcome::Fetched { changed: false });

        let much_later = later + Duration::minutes(10);
        let (snap, outcome) = c.load(&mut backend, "shop-1", much_later).unwrap();
        assert_eq!(outcome, LoadOutcome::Fetched { changed: true });
        assert_eq!(snap, snapshot("19:00"));
        assert_eq!(c.entry("shop-1").unwrap().fetched_at, much_later);
    }

    #[test]
    fn test_backend_failure_serves_stale_copy() {
        let mut c = cache();
        let mut backend = ScriptedBackend::new(vec![
            Ok(snapshot("18:00")),
            Err(HoursError::Backend("503".to_string())),
            Ok(snapshot("20:00")),
        ]);
        c.load(&mut backend, "shop-1", now()).unwrap();

        let later = now() + Duration::hours(1);
        let (snap, outcome) = c.load(&mut backend, "shop-1", later).unwrap();
        assert_eq!(snap, snapshot("18:00"));
        assert!(matches!(outcome, LoadOutcome::Stale { .. }));

        // Retry on next load.
        let (snap, _) = c.load(&mut backend, "shop-1", later).unwrap();
        assert_eq!(snap, snapshot("20:00"));
    }

    #[test]
    fn test_backend_failure_without_copy_is_error() {
        let mut c = cache();
        let mut backend = ScriptedBackend::new(vec![]);
        let err = c.load(&mut backend, "shop-1", now()).unwrap_err();
        assert!(matches!(err, HoursError::Backend(_)));
    }

    #[test]
    fn test_clock_going_backwards_forces_fetch() {
        let mut c = cache();
        c.reconcile(snapshot("18:00"), now());
        assert!(c.get("shop-1", now() - Duration::minutes(1)).is_none());
        assert!(c.get("shop-1", now()).is_some());
    }

    #[test]
    fn test_invalidate() {
        let mut c = cache();
        c.reconcile(snapshot("18:00"), now());
        assert!(c.invalidate("shop-1").is_some());
        assert!(c.is_empty());
    }

    #[test]
    fn test_json_round_trip_keeps_freshness() {
        let mut c = cache();
        c.reconcile(snapshot("18:00"), now());
        let restored = HoursCache::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(restored, c);
        assert_eq!(restored.ttl(), Duration::minutes(10));
        assert!(restored.get("shop-1", now()).is_some());
    }

    #[test]
    fn test_json_round_trip_keeps_seconds() {
        let mut c = cache();
        let mut snap = snapshot("18:00");
        snap.schedule.set_day(
            Weekday::Wed,
            DayHours::open(vec![TimeRange::parse("09:00:10", "09:00:50").unwrap()]).unwrap(),
        );
        c.reconcile(snap.clone(), now());
        let restored = HoursCache::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(restored.entry("shop-1").unwrap().snapshot, snap);
    }

    #[test]
    fn test_from_json_drops_snapshot_with_bad_step() {
        let mut c = cache();
        c.reconcile(snapshot("18:00"), now());
        let mut bad = snapshot("18:00");
        bad.shop_id = "shop-2".to_string();
        bad.options.slot_step_minutes = 7;
        c.reconcile(bad, now());
        assert_eq!(c.len(), 2);

        let restored = HoursCache::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(restored.len(), 1);
        assert!(restored.entry("shop-1").is_some());
        assert!(restored.entry("shop-2").is_none());
    }

    #[test]
    fn test_snapshot_for_other_shop_is_rejected() {
        let mut c = cache();
        let mut other = snapshot("18:00");
        other.shop_id = "other".to_string();
        let mut backend = ScriptedBackend::new(vec![Ok(other)]);
        let err = c.load(&mut backend, "shop-1", now()).unwrap_err();
        assert!(matches!(err, HoursError::Backend(_)));
        assert!(c.is_empty());
    }

    #[test]
    fn test_snapshot_for_other_shop_serves_stale_copy() {
        let mut c = cache();
        let mut other = snapshot("20:00");
        other.shop_id = "other".to_string();
        let mut backend = ScriptedBackend::new(vec![Ok(snapshot("18:00")), Ok(other)]);
        c.load(&mut backend, "shop-1", now()).unwrap();

        let later = now() + Duration::hours(1);
        let (snap, outcome) = c.load(&mut backend, "shop-1", later).unwrap();
        assert_eq!(snap, snapshot("18:00"));
        assert!(matches!(outcome, LoadOutcome::Stale { .. }));
        assert!(c.entry("other").is_none());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = HoursCache::from_json("{not json").unwrap_err();
        assert!(matches!(err, HoursError::Cache(_)));
    }

    #[test]
    fn test_snapshot_builds_engine() {
        let engine = snapshot("18:00").to_engine().unwrap();
        let tuesday = chrono::NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert!(engine.hours_for(tuesday).is_open());
    }
}
