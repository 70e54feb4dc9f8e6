pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_FILE_NAME: &str = "daily.json";
pub const SCHEMA_VERSION: &str = "1.0";
pub const DEFAULT_DESCRIPTION: &str = "Daily API request statistics";
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
pub const HOURS_PER_DAY: usize = 24;
pub const MAX_RETAINED_DAYS: usize = 30;
pub const CREDENTIAL_PREFIX_CHARS: usize = 6;
pub const CREDENTIAL_MASK: &str = "******";
