pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock, TimezonePolicy};
pub use config::{load_or_init_config, StatsConfig};
pub use error::{Result, StatsError};
pub use stats::{
    mask_credential, DailyDocument, DailyStats, DailyStatsStore, HourlyStats, JsonFileBackend,
    PersistWorker, RequestStats, StatsBackend, TokenStats, UsageCounter, UsageObservation,
};
