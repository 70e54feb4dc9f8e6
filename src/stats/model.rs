use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{HOURS_PER_DAY, SCHEMA_VERSION};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub total: u64,
    pub prompt: u64,
    pub completion: u64,
}

/// `{requests, tokens}` pair used for model and credential buckets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
    pub requests: u64,
    pub tokens: u64,
}

impl UsageCounter {
    pub(crate) fn bump(&mut self, requests: u64, tokens: u64) {
        self.requests = self.requests.saturating_add(requests);
        self.tokens = self.tokens.saturating_add(tokens);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyStats {
    pub hour: u8,
    pub requests: u64,
    pub tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: String,
    pub requests: RequestStats,
    pub tokens: TokenStats,
    #[serde(default)]
    pub models: BTreeMap<String, UsageCounter>,
    #[serde(default)]
    pub hourly: Vec<HourlyStats>,
}

impl DailyStats {
    /// Fresh record for `date` with all 24 hourly buckets zeroed.
    pub fn empty(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            requests: RequestStats::default(),
            tokens: TokenStats::default(),
            models: BTreeMap::new(),
            hourly: zeroed_hours(),
        }
    }

    /// Folds one usage observation into this record.
    pub(crate) fn apply(&mut self, obs: &UsageObservation<'_>, hour: usize) {
        let tokens = obs.total_tokens();

        self.requests.total = self.requests.total.saturating_add(obs.request_count);
        if obs.success {
            self.requests.success = self.requests.success.saturating_add(obs.request_count);
        } else {
            self.requests.failed = self.requests.failed.saturating_add(obs.request_count);
        }

        self.tokens.total = self.tokens.total.saturating_add(tokens);
        self.tokens.prompt = self.tokens.prompt.saturating_add(obs.prompt_tokens);
        self.tokens.completion = self.tokens.completion.saturating_add(obs.completion_tokens);

        if !obs.model.is_empty() {
            self.models
                .entry(obs.model.to_string())
                .or_default()
                .bump(obs.request_count, tokens);
        }

        if self.hourly.len() != HOURS_PER_DAY {
            self.repair_hourly();
        }
        if let Some(bucket) = self.hourly.get_mut(hour) {
            bucket.requests = bucket.requests.saturating_add(obs.request_count);
            bucket.tokens = bucket.tokens.saturating_add(tokens);
        }
    }

    /// Rebuilds `hourly` as exactly 24 ordered buckets, keeping counts from any
    /// well-formed entries already present.
    pub(crate) fn repair_hourly(&mut self) {
        let mut fixed = zeroed_hours();
        for entry in &self.hourly {
            if let Some(slot) = fixed.get_mut(entry.hour as usize) {
                slot.requests = slot.requests.saturating_add(entry.requests);
                slot.tokens = slot.tokens.saturating_add(entry.tokens);
            }
        }
        self.hourly = fixed;
    }

    pub(crate) fn hourly_is_well_formed(&self) -> bool {
        self.hourly.len() == HOURS_PER_DAY
            && self
                .hourly
                .iter()
                .enumerate()
                .all(|(i, h)| h.hour as usize == i)
    }
}

fn zeroed_hours() -> Vec<HourlyStats> {
    (0..HOURS_PER_DAY)
        .map(|h| HourlyStats {
            hour: h as u8,
            requests: 0,
            tokens: 0,
        })
        .collect()
}

/// The persisted root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDocument {
    pub version: String,
    pub description: String,
    pub last_updated: String,
    #[serde(default)]
    pub daily_stats: Vec<DailyStats>,
    /// masked credential -> date -> counters
    #[serde(default)]
    pub keys_usage: BTreeMap<String, BTreeMap<String, UsageCounter>>,
}

impl DailyDocument {
    pub fn new(
        description: impl Into<String>,
        today: impl Into<String>,
        now: impl Into<String>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            description: description.into(),
            last_updated: now.into(),
            daily_stats: vec![DailyStats::empty(today)],
            keys_usage: BTreeMap::new(),
        }
    }
}

/// One batch of requests as reported by the serving layer.
#[derive(Debug, Clone, Copy)]
pub struct UsageObservation<'a> {
    pub credential: &'a str,
    pub model: &'a str,
    pub request_count: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub success: bool,
}

impl UsageObservation<'_> {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}
