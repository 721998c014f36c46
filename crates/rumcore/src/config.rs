//! Configuration constants for the bot

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: rumbot.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "rumbot.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: rumbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "rumbot.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Optional custom Bot API server
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env::var("BOT_API_URL").ok());

/// Handle of the permanent administrator (compared case-insensitively, without '@')
/// Read from SUPERUSER_USERNAME environment variable
pub static SUPERUSER_USERNAME: Lazy<String> = Lazy::new(|| {
    env::var("SUPERUSER_USERNAME")
        .map(|raw| raw.trim().trim_start_matches('@').to_string())
        .unwrap_or_else(|_| "My_Beautifu1_Madness".to_string())
});

/// Store access configuration
pub mod store {
    use super::Duration;

    /// Bound for single-profile reads and writes (in seconds)
    pub const QUERY_TIMEOUT_SECS: u64 = 5;

    /// Bound for multi-row reads: lists, stats, log reports (in seconds)
    pub const SCAN_TIMEOUT_SECS: u64 = 10;

    /// Maximum number of pooled SQLite connections
    pub const POOL_MAX_SIZE: u32 = 8;

    /// Single-profile operation timeout
    pub fn query_timeout() -> Duration {
        Duration::from_secs(QUERY_TIMEOUT_SECS)
    }

    /// Multi-row operation timeout
    pub fn scan_timeout() -> Duration {
        Duration::from_secs(SCAN_TIMEOUT_SECS)
    }
}

/// Resource log retention
pub mod logs {
    use super::Duration;

    /// Log rows older than this are purged
    pub const RETENTION_DAYS: i64 = 30;

    /// Interval between retention purges (in seconds)
    pub const PURGE_INTERVAL_SECS: u64 = 60 * 60;

    /// Retention window as a chrono duration
    pub fn retention() -> chrono::Duration {
        chrono::Duration::days(RETENTION_DAYS)
    }

    /// Purge interval duration
    pub fn purge_interval() -> Duration {
        Duration::from_secs(PURGE_INTERVAL_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    /// Dispatcher retry delay duration
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
}

/// Profile defaults applied at registration
pub mod profile {
    /// Starting rank ("recruit")
    pub const DEFAULT_RANK: &str = "Ис";

    /// Starting team ("mercenary")
    pub const DEFAULT_TEAM: &str = "Наемник";

    /// Starting inventory ("empty")
    pub const DEFAULT_INVENTORY: &str = "Пусто";

    /// Mark appended to administrators' names
    pub const ADMIN_MARK: &str = "🏴‍☠️";
}

/// Telegram limits
pub mod telegram {
    /// Maximum message length (with margin below the 4096 hard limit)
    pub const MAX_MESSAGE_LENGTH: usize = 4000;
}
