use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::store::DailyStatsStore;

/// Single-slot dirty flag shared by the recorders and the persist worker.
#[derive(Default)]
pub(crate) struct PersistSignal {
    dirty: AtomicBool,
    closed: AtomicBool,
    notify: Notify,
}

impl PersistSignal {
    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_one();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Handle to the background task that writes the document after mutations.
///
/// The task keeps its own store clone, so dropping this handle does not stop
/// it; [`shutdown`](Self::shutdown) is the only way to stop the worker and get
/// its final flush.
pub struct PersistWorker {
    store: DailyStatsStore,
    handle: JoinHandle<()>,
}

impl PersistWorker {
    /// Stops the worker after writing any pending changes.
    pub async fn shutdown(self) {
        self.store.inner.persist.close();
        if let Err(e) = self.handle.await {
            log::error!("daily stats persist worker failed: {e}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl DailyStatsStore {
    /// Starts the persist worker on the current tokio runtime.
    ///
    /// Mutations that arrive while a save is running are coalesced into one
    /// follow-up save. Failures are logged and dropped.
    pub fn spawn_persist_worker(&self) -> PersistWorker {
        let store = self.clone();
        let handle = tokio::spawn(run_persist_worker(self.clone()));
        PersistWorker { store, handle }
    }

    /// Starts a detached persist worker for the rest of the process.
    ///
    /// Runs on the ambient tokio runtime when there is one, otherwise on a
    /// dedicated thread driving its own single-threaded runtime.
    pub fn start_background_persist(&self) {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(run_persist_worker(self.clone()));
            return;
        }
        let store = self.clone();
        let spawned = std::thread::Builder::new()
            .name("daily-stats-persist".to_string())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread().build() {
                    Ok(rt) => rt.block_on(run_persist_worker(store)),
                    Err(e) => log::error!("daily stats persist runtime failed to start: {e}"),
                }
            });
        if let Err(e) = spawned {
            log::error!("failed to spawn daily stats persist thread: {e}");
        }
    }
}

async fn run_persist_worker(store: DailyStatsStore) {
    loop {
        store.inner.persist.notify.notified().await;
        let closing = store.inner.persist.is_closed();
        save_if_dirty(&store).await;
        if closing {
            break;
        }
    }
    log::info!("daily stats persist worker stopped");
}

async fn save_if_dirty(store: &DailyStatsStore) {
    if !store.inner.persist.take_dirty() {
        return;
    }
    let s = store.clone();
    match tokio::task::spawn_blocking(move || s.persist_now()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("failed to save daily stats: {e}"),
        Err(e) => log::error!("daily stats save task failed: {e}"),
    }
}
