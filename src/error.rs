//! Error types for daemon queries and the poll cycle.
//!
//! None of these are fatal. The poller absorbs every one of them into the
//! tick report and keeps going.

use thiserror::Error;

/// Failure of a single JSON-RPC call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("node rejected call ({code}): {message}")]
    Node { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RpcError {
    /// Classify a transport error the same way the HTTP client reports them
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RpcError::Timeout
        } else if e.is_connect() {
            RpcError::Connection(e.to_string())
        } else if e.is_decode() {
            RpcError::Malformed(e.to_string())
        } else {
            RpcError::Connection(format!("request failed: {}", e))
        }
    }
}

/// Snapshot field a query was meant to refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    NetworkId,
    ClientVersion,
    Coinbase,
    Unlocked,
    GasPrice,
    BlockNumber,
    Block,
    PeerCount,
    Mining,
    Hashrate,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::NetworkId => "network_id",
            Field::ClientVersion => "client_version",
            Field::Coinbase => "coinbase",
            Field::Unlocked => "unlocked",
            Field::GasPrice => "gas_price",
            Field::BlockNumber => "block_number",
            Field::Block => "block",
            Field::PeerCount => "peer_count",
            Field::Mining => "mining",
            Field::Hashrate => "hashrate",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Degradation observed during one poll cycle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    #[error("daemon unreachable")]
    Unreachable,

    #[error("query for {field} failed: {source}")]
    Query { field: Field, source: RpcError },

    #[error("account {0} is locked")]
    AccountLocked(String),

    #[error("no unlocked account available")]
    NoAccountAvailable,
}

impl PollError {
    pub fn query(field: Field, source: RpcError) -> Self {
        PollError::Query { field, source }
    }
}
