use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use crate::clock::{Clock, SystemClock, TimezonePolicy};
use crate::config::StatsConfig;
use crate::error::{Result, StatsError};

use super::codec::{ensure_data_dir, JsonFileBackend, StatsBackend};
use super::mask::mask_credential;
use super::model::{DailyDocument, DailyStats, UsageCounter, UsageObservation};
use super::persist::PersistSignal;

/// Handle to the process-wide daily usage document.
///
/// Cloning is cheap; all clones share one document, one backend and one
/// persist signal.
#[derive(Clone)]
pub struct DailyStatsStore {
    pub(super) inner: Arc<StoreInner>,
}

pub(super) struct StoreInner {
    data_dir: PathBuf,
    description: String,
    timezone: TimezonePolicy,
    backend: Arc<dyn StatsBackend>,
    clock: Arc<dyn Clock>,
    doc: RwLock<Option<DailyDocument>>,
    // Orders whole-file writes so the newest snapshot is always the last one on disk.
    save_lock: Mutex<()>,
    pub(super) persist: PersistSignal,
}

impl DailyStatsStore {
    /// Builds an uninitialized store. Reads return nothing until
    /// [`initialize`](Self::initialize) runs or the first usage is recorded.
    pub fn new(config: StatsConfig, backend: Arc<dyn StatsBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                data_dir: config.data_dir,
                description: config.description,
                timezone: config.timezone,
                backend,
                clock,
                doc: RwLock::new(None),
                save_lock: Mutex::new(()),
                persist: PersistSignal::default(),
            }),
        }
    }

    /// JSON file under `config.data_dir`, system clock, initialized, with a
    /// detached persist worker so every recorded usage reaches disk.
    pub fn open(config: StatsConfig) -> Result<Self> {
        let backend = JsonFileBackend::new(config.file_path());
        let store = Self::new(config, Arc::new(backend), Arc::new(SystemClock));
        store.initialize()?;
        store.start_background_persist();
        Ok(store)
    }

    /// Load-or-create, then make sure today's record exists.
    pub fn initialize(&self) -> Result<()> {
        if let Err(e) = ensure_data_dir(&self.inner.data_dir) {
            log::error!("failed to create stats data dir: {e}");
            return Err(e);
        }

        match self.inner.backend.load() {
            Ok(mut doc) => {
                let fixed = doc.normalize();
                if fixed > 0 {
                    log::warn!("daily stats: repaired or dropped {fixed} stored day records");
                }
                *self.inner.doc.write() = Some(doc);
                log::info!("loaded daily stats");
            }
            Err(StatsError::NotFound(_)) => {
                let doc = self.fresh_document(self.inner.clock.now());
                *self.inner.doc.write() = Some(doc);
                if let Err(e) = self.persist_now() {
                    log::error!("failed to save daily stats: {e}");
                    return Err(e);
                }
                log::info!("created new daily stats file");
            }
            Err(StatsError::Decode { path, source }) => {
                log::error!("failed to load daily stats: {source}");
                return Err(StatsError::CorruptState {
                    path,
                    reason: source.to_string(),
                });
            }
            Err(e) => {
                log::error!("failed to load daily stats: {e}");
                return Err(StatsError::CorruptState {
                    path: e.path().to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }

        self.ensure_today();
        Ok(())
    }

    /// Appends today's record if missing. Returns true when a new day was started.
    pub fn ensure_today(&self) -> bool {
        let now = self.inner.clock.now();
        let today = self.inner.timezone.day_key(now);
        let added = {
            let mut guard = self.inner.doc.write();
            match guard.as_mut() {
                Some(doc) => doc.ensure_day(&today),
                None => {
                    *guard = Some(self.fresh_document(now));
                    true
                }
            }
        };
        if added {
            self.inner.persist.mark_dirty();
        }
        added
    }

    /// Folds one batch of requests into today's counters and schedules a save.
    ///
    /// Never blocks on I/O. Durability follows whenever the persist worker (or
    /// an explicit [`flush`](Self::flush)) next writes the document.
    pub fn record_usage(
        &self,
        credential: &str,
        model: &str,
        request_count: u64,
        prompt_tokens: u64,
        completion_tokens: u64,
        success: bool,
    ) {
        self.record(&UsageObservation {
            credential,
            model,
            request_count,
            prompt_tokens,
            completion_tokens,
            success,
        });
    }

    pub fn record(&self, obs: &UsageObservation<'_>) {
        let now = self.inner.clock.now();
        let tz = self.inner.timezone;
        let today = tz.day_key(now);
        let hour = tz.hour(now);
        {
            let mut guard = self.inner.doc.write();
            let doc = guard.get_or_insert_with(|| self.fresh_document(now));
            doc.day_mut_or_insert(&today).apply(obs, hour);
            if !obs.credential.is_empty() {
                doc.credential_usage_mut(&mask_credential(obs.credential), &today)
                    .bump(obs.request_count, obs.total_tokens());
            }
        }
        self.inner.persist.mark_dirty();
    }

    /// Copy of the record for `date`, or today's when `date` is empty.
    pub fn get_daily(&self, date: &str) -> Option<DailyStats> {
        let date = self.resolve_date(date);
        let guard = self.inner.doc.read();
        guard.as_ref()?.find_day(&date).cloned()
    }

    /// Usage for the credential's masked key on `date` (today when empty).
    pub fn get_credential_usage(&self, credential: &str, date: &str) -> Option<UsageCounter> {
        let date = self.resolve_date(date);
        let masked = mask_credential(credential);
        let guard = self.inner.doc.read();
        guard.as_ref()?.credential_usage(&masked, &date).copied()
    }

    /// Every retained record keyed by date. On duplicate dates the record
    /// stored last wins.
    pub fn get_all_daily(&self) -> BTreeMap<String, DailyStats> {
        let guard = self.inner.doc.read();
        let mut out = BTreeMap::new();
        if let Some(doc) = guard.as_ref() {
            for day in &doc.daily_stats {
                out.insert(day.date.clone(), day.clone());
            }
        }
        out
    }

    /// Full copy of the current document.
    pub fn snapshot(&self) -> Option<DailyDocument> {
        self.inner.doc.read().clone()
    }

    pub fn last_updated(&self) -> Option<String> {
        self.inner
            .doc
            .read()
            .as_ref()
            .map(|doc| doc.last_updated.clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.doc.read().is_some()
    }

    /// Writes the document now, on the calling thread.
    pub fn flush(&self) -> Result<()> {
        self.inner.persist.take_dirty();
        self.persist_now()
    }

    /// Stamps `last_updated` and clones under the write lock, then serializes
    /// with no document lock held.
    pub(super) fn persist_now(&self) -> Result<()> {
        let _save = self.inner.save_lock.lock();
        let snapshot = {
            let mut guard = self.inner.doc.write();
            let Some(doc) = guard.as_mut() else {
                return Ok(());
            };
            doc.last_updated = self.inner.timezone.timestamp(self.inner.clock.now());
            doc.clone()
        };
        self.inner.backend.save(&snapshot)
    }

    fn resolve_date(&self, date: &str) -> String {
        if date.is_empty() {
            self.inner.timezone.day_key(self.inner.clock.now())
        } else {
            date.to_string()
        }
    }

    fn fresh_document(&self, now: DateTime<Utc>) -> DailyDocument {
        let tz = self.inner.timezone;
        DailyDocument::new(
            self.inner.description.clone(),
            tz.day_key(now),
            tz.timestamp(now),
        )
    }
}
