use chrono::{DateTime, Local, SecondsFormat, TimeZone, Timelike, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants::DAY_KEY_FORMAT;

/// Wall-clock source used for day/hour bucketing and `last_updated` stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used to simulate day rollovers.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        min: u32,
        sec: u32,
    ) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self::new)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Timezone the day and hour boundaries are computed in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimezonePolicy {
    #[default]
    Utc,
    Local,
}

impl TimezonePolicy {
    /// `YYYY-MM-DD` for the given instant.
    pub fn day_key(self, at: DateTime<Utc>) -> String {
        match self {
            TimezonePolicy::Utc => at.format(DAY_KEY_FORMAT).to_string(),
            TimezonePolicy::Local => at.with_timezone(&Local).format(DAY_KEY_FORMAT).to_string(),
        }
    }

    /// Hour of day in `0..24`.
    pub fn hour(self, at: DateTime<Utc>) -> usize {
        let h = match self {
            TimezonePolicy::Utc => at.hour(),
            TimezonePolicy::Local => at.with_timezone(&Local).hour(),
        };
        h as usize
    }

    /// RFC 3339 timestamp, seconds precision.
    pub fn timestamp(self, at: DateTime<Utc>) -> String {
        match self {
            TimezonePolicy::Utc => at.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimezonePolicy::Local => at
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::Secs, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_policy_extracts_day_and_hour() {
        let clock = ManualClock::from_ymd_hms(2025, 3, 17, 23, 59, 59).unwrap();
        let now = clock.now();
        assert_eq!(TimezonePolicy::Utc.day_key(now), "2025-03-17");
        assert_eq!(TimezonePolicy::Utc.hour(now), 23);
        assert_eq!(TimezonePolicy::Utc.timestamp(now), "2025-03-17T23:59:59Z");

        clock.advance(chrono::Duration::seconds(1));
        let now = clock.now();
        assert_eq!(TimezonePolicy::Utc.day_key(now), "2025-03-18");
        assert_eq!(TimezonePolicy::Utc.hour(now), 0);
    }

    #[test]
    fn local_policy_hour_is_in_range() {
        let now = SystemClock.now();
        assert!(TimezonePolicy::Local.hour(now) < 24);
        assert_eq!(TimezonePolicy::Local.day_key(now).len(), 10);
    }

    #[test]
    fn policy_parses_lowercase_names() {
        #[derive(Deserialize)]
        struct Wrap {
            tz: TimezonePolicy,
        }
        let w: Wrap = toml::from_str("tz = \"local\"").unwrap();
        assert_eq!(w.tz, TimezonePolicy::Local);
        let w: Wrap = toml::from_str("tz = \"utc\"").unwrap();
        assert_eq!(w.tz, TimezonePolicy::Utc);
    }
}
