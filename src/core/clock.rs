use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use std::sync::{Arc, RwLock};

/// Source of "now" for the engine.
///
/// Calendar days are derived from `now()` shifted by `offset()`, so a day
/// boundary is local midnight rather than UTC midnight when an offset is set.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn offset(&self) -> FixedOffset {
        Utc.fix()
    }

    fn today(&self) -> NaiveDate {
        calendar_day(self.now(), self.offset())
    }
}

/// Calendar day of `instant` as seen from `offset`.
pub fn calendar_day(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    offset.from_utc_datetime(&instant.naive_utc()).date_naive()
}

/// Whole calendar days from `earlier` to `later` (negative if the clock went backwards).
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

pub fn offset_from_minutes(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes * 60).unwrap_or_else(|| Utc.fix())
}

/// Wall clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// A clock that only moves when told to. Clones share the same instant, so a
/// test can keep one handle and give another to the engine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
            offset: Utc.fix(),
        }
    }

    /// Noon (UTC) on the given day.
    pub fn at_day(day: NaiveDate) -> Self {
        let noon = day
            .and_hms_opt(12, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt))
            .unwrap_or_else(Utc::now);
        Self::new(noon)
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read().map(|guard| *guard).unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_manual_clock_shares_instant() {
        let clock = ManualClock::at_day(day(2024, 3, 1));
        let handle = clock.clone();
        handle.advance_days(2);
        assert_eq!(clock.today(), day(2024, 3, 3));
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        let late_evening = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(calendar_day(late_evening, Utc.fix()), day(2024, 3, 1));
        assert_eq!(calendar_day(late_evening, offset_from_minutes(60)), day(2024, 3, 2));
        assert_eq!(calendar_day(late_evening, offset_from_minutes(-600)), day(2024, 3, 1));
    }

    #[test]
    fn test_days_between_is_calendar_based() {
        // 23:59 -> 00:01 is one calendar day even though only two minutes passed
        let before = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 2, 0, 1, 0).unwrap();
        let offset = Utc.fix();
        assert_eq!(days_between(calendar_day(before, offset), calendar_day(after, offset)), 1);
        assert_eq!(days_between(day(2024, 3, 5), day(2024, 3, 2)), -3);
    }
}
