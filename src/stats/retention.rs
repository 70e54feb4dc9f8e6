use crate::constants::MAX_RETAINED_DAYS;

use super::model::{DailyDocument, DailyStats, UsageCounter};

impl DailyDocument {
    /// First record whose date matches.
    pub fn find_day(&self, date: &str) -> Option<&DailyStats> {
        self.daily_stats.iter().find(|d| d.date == date)
    }

    /// Returns the record for `date`, appending a zeroed one if none exists.
    ///
    /// Appending past the cap drops the oldest-inserted records, regardless of
    /// their dates.
    pub(crate) fn day_mut_or_insert(&mut self, date: &str) -> &mut DailyStats {
        let idx = match self.daily_stats.iter().position(|d| d.date == date) {
            Some(i) => i,
            None => {
                self.daily_stats.push(DailyStats::empty(date));
                self.enforce_retention();
                self.daily_stats.len() - 1
            }
        };
        &mut self.daily_stats[idx]
    }

    /// Appends a record for `date` if missing. Returns true when one was added.
    pub(crate) fn ensure_day(&mut self, date: &str) -> bool {
        if self.find_day(date).is_some() {
            return false;
        }
        self.day_mut_or_insert(date);
        true
    }

    pub(crate) fn enforce_retention(&mut self) -> usize {
        let excess = self.daily_stats.len().saturating_sub(MAX_RETAINED_DAYS);
        if excess > 0 {
            self.daily_stats.drain(..excess);
        }
        excess
    }

    pub(crate) fn credential_usage_mut(&mut self, masked: &str, date: &str) -> &mut UsageCounter {
        self.keys_usage
            .entry(masked.to_string())
            .or_default()
            .entry(date.to_string())
            .or_default()
    }

    pub fn credential_usage(&self, masked: &str, date: &str) -> Option<&UsageCounter> {
        self.keys_usage.get(masked)?.get(date)
    }

    /// Brings a document read from disk back within the in-memory invariants.
    /// Returns the number of records that needed fixing or dropping.
    pub(crate) fn normalize(&mut self) -> usize {
        let mut fixed = 0;
        for day in &mut self.daily_stats {
            if !day.hourly_is_well_formed() {
                day.repair_hourly();
                fixed += 1;
            }
        }
        fixed + self.enforce_retention()
    }
}
