//! Centralized constants used throughout the application.

// =============================================================================
// Outbound API Retry Settings
// =============================================================================

/// Attempts for block-indexing API calls before the scan gives up.
pub const SCAN_MAX_ATTEMPTS: u32 = 5;
/// Attempts for coordination API calls before the queue is reported unavailable.
pub const QUEUE_MAX_ATTEMPTS: u32 = 4;
/// Initial backoff delay, doubled after each failed attempt.
pub const RETRY_BASE_DELAY_SECS: u64 = 1;
/// Backoff cap.
pub const RETRY_MAX_DELAY_SECS: u64 = 60;

/// Per-request timeout for indexing API calls.
pub const SCAN_REQUEST_TIMEOUT_SECS: u64 = 5;
/// Per-request timeout for coordination API calls.
pub const QUEUE_REQUEST_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Deposit Scanning
// =============================================================================

/// Lookback window when no checkpoint exists (65 minutes).
pub const DEFAULT_LOOKBACK_SECS: u64 = 3900;

/// Deposits at or above this many tokens raise an alert.
pub const FLAG_THRESHOLD_TOKENS: u64 = 100_000;

/// Starting chunk size for historical block-range walks.
pub const INITIAL_CHUNK_BLOCKS: u64 = 25_000;
/// The chunk size is halved on repeated failures, but never below this floor.
pub const MIN_CHUNK_BLOCKS: u64 = 3_125;
/// Attempts per chunk before the chunk size is reduced.
pub const CHUNK_RETRY_LIMIT: u32 = 2;
/// Base backoff between chunk retries, multiplied by the retry index.
pub const CHUNK_RETRY_BACKOFF_SECS: u64 = 10;

/// Default checkpoint file path.
pub const DEFAULT_CHECKPOINT_PATH: &str = "last_scanned_block.json";

// =============================================================================
// Transaction Queue
// =============================================================================

/// How many recent coordination-feed records each fetch considers.
pub const QUEUE_FETCH_LIMIT: usize = 15;

// =============================================================================
// Execution Engine
// =============================================================================

/// Total submission attempts for one nonce before the circuit breaker trips.
pub const EXEC_MAX_ATTEMPTS: u32 = 3;
/// Cooldown between submission attempts.
pub const EXEC_COOLDOWN_SECS: u64 = 60;
/// The cooldown polls the pause flag at this interval.
pub const EXEC_PAUSE_POLL_SECS: u64 = 1;
/// Gas limit for the multisig execution call.
pub const EXEC_GAS_LIMIT: u64 = 350_000;
/// How long to wait for a submission receipt before treating it as a revert.
pub const RECEIPT_TIMEOUT_SECS: u64 = 240;

// =============================================================================
// Scheduler
// =============================================================================

/// Interval between periodic rechecks.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 3600;
/// UTC hour after which the once-daily summary is emitted.
pub const DAILY_REPORT_UTC_HOUR: u32 = 9;

// =============================================================================
// Network Defaults
// =============================================================================

/// Default block-indexing API endpoint (chain id baked into the query).
pub const DEFAULT_INDEXER_URL: &str = "https://api.etherscan.io/v2/api?chainid=146";

/// Watched deposit contract.
pub const DEFAULT_DEPOSIT_CONTRACT: &str = "0xE5DA20F15420aD15DE0fa650600aFc998bbE3955";

/// Deposit event topic the log queries filter on.
pub const DEFAULT_DEPOSIT_EVENT_TOPIC: &str =
    "0x73a19dd210f1a7f902193214c0ee91dd35ee5b4d920cba8d519eca65a7b488ca";
