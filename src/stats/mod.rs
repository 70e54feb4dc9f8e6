//! Rolling per-day usage counters persisted as one JSON document.

pub mod codec;
pub mod mask;
pub mod model;
mod persist;
mod retention;
pub mod store;

pub use codec::{JsonFileBackend, StatsBackend};
pub use mask::mask_credential;
pub use model::{
    DailyDocument, DailyStats, HourlyStats, RequestStats, TokenStats, UsageCounter,
    UsageObservation,
};
pub use persist::PersistWorker;
pub use store::DailyStatsStore;
