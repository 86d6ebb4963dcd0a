//! Application constants
//!
//! Centralized location for polling cadence and endpoint defaults.

use std::time::Duration;

/// Delay between two liveness checks. Fixed: no backoff, no jitter.
pub const POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Chain age (seconds) above which mining and hash rate are not polled
pub const MAX_BLOCKCHAIN_AGE_SECS: i64 = 300;

/// Default per-request timeout for the JSON-RPC client
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default local daemon endpoint
pub const DEFAULT_LOCAL_NODE: &str = "http://localhost:8545";

/// Hosted fallback nodes, tried in order when no local node is configured
pub const DEFAULT_HOSTED_NODES: &[&str] = &["https://eth3.augur.net", "https://eth5.augur.net"];

/// Data passed to `eth_sign` when probing whether an account is unlocked
pub const UNLOCK_PROBE_DATA: &str =
    "0x00000000000000000000000000000000000000000000000000000000000f69b5";

/// Default log file name
pub const DEFAULT_LOG_FILE: &str = "chainwatch.log";

/// Application name
pub const APP_NAME: &str = "chainwatch";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
