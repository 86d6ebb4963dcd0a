use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HOSTED_NODES, DEFAULT_LOCAL_NODE};

/// Daemon connection status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkStatus {
    #[default]
    Disconnected,
    Failed,
    Connected,
    NoAccount,
}

impl NetworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkStatus::Disconnected => "disconnected",
            NetworkStatus::Failed => "failed",
            NetworkStatus::Connected => "connected",
            NetworkStatus::NoAccount => "no account",
        }
    }
}

impl std::fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the poller currently knows about the daemon and the chain
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkSnapshot {
    pub status: NetworkStatus,
    pub network_id: Option<String>,
    pub client_version: Option<String>,
    /// Gas price in ether, decimal string
    pub gas_price: Option<String>,
    pub block_number: Option<u64>,
    pub block_time: Option<DateTime<Utc>>,
    pub peer_count: Option<u64>,
    /// Seconds between the head block timestamp and the local clock
    pub block_chain_age: Option<i64>,
    pub mining: Option<bool>,
    pub hashrate: Option<u64>,
}

/// Where the active account came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountSource {
    ClientKey,
    Node,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountSnapshot {
    pub address: Option<String>,
    pub unlocked: bool,
    pub source: Option<AccountSource>,
    pub handle: Option<String>,
}

/// A key held by the client rather than by the daemon
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientAccount {
    pub address: String,
    pub private_key: String,
    #[serde(default)]
    pub handle: Option<String>,
}

// Keep the key out of logs.
impl std::fmt::Debug for ClientAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientAccount")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Daemon endpoints: an optional local node and a list of hosted fallbacks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub local: Option<String>,
    pub hosted: Vec<String>,
}

impl Endpoints {
    /// Local endpoint if configured, otherwise the first hosted one
    pub fn select(&self) -> Option<&str> {
        self.local
            .as_deref()
            .or_else(|| self.hosted.first().map(String::as_str))
    }

    pub fn is_hosted(&self, url: &str) -> bool {
        self.local.as_deref() != Some(url)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            local: Some(String::from(DEFAULT_LOCAL_NODE)),
            hosted: DEFAULT_HOSTED_NODES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Endpoint the client is currently pointed at
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HostState {
    pub host: Option<String>,
    pub is_hosted: bool,
}

/// Head block fields the poller cares about
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub number: u64,
    /// Unix seconds
    pub timestamp: i64,
}
