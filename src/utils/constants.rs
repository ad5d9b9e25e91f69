//! Constants shared across the watcher.

/// Default tick interval in seconds
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;

/// Default number of gateway calls allowed to run at the same time
pub const DEFAULT_MAX_CONCURRENT_POLLS: usize = 16;

/// Largest accepted value of `MAX_CONCURRENT_POLLS`
pub const MAX_CONCURRENT_POLLS_LIMIT: usize = 4096;

/// Default upper bound for a single gateway call in seconds
pub const DEFAULT_POLL_TIMEOUT_SECONDS: u64 = 30;

/// Default grace period granted to in-flight polls on shutdown, in seconds
pub const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 5;

/// Default location of the durable subscription file
pub const DEFAULT_SUBSCRIPTIONS_PATH: &str = "data/subscriptions.json";

/// Default Telegram Bot API base URL
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Default notification title template
pub const DEFAULT_NOTIFICATION_TITLE: &str = "New activity on ${address}";

/// Default notification body template
pub const DEFAULT_NOTIFICATION_BODY: &str =
	"Address ${address} has a new transaction: ${transaction_id}";

/// Default directory for log files
pub const DEFAULT_LOG_DIR: &str = "logs/";

/// Base name of the log file
pub const LOG_FILE_NAME: &str = "watcher.log";

/// Default maximum log file size before rolling (1GiB)
pub const DEFAULT_LOG_MAX_SIZE: u64 = 1_073_741_824;

/// Default metrics server address when running outside of Docker
pub const DEFAULT_METRICS_ADDRESS: &str = "127.0.0.1:8081";
