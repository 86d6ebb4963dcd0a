//! Network messages - events flowing from the poller to the store layer

use chrono::{DateTime, Utc};

use crate::models::{AccountSnapshot, NetworkStatus};

/// Partial network update. `None` fields leave the snapshot untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkDelta {
    pub network_id: Option<String>,
    pub client_version: Option<String>,
    pub gas_price: Option<String>,
    pub block_number: Option<u64>,
    pub block_time: Option<DateTime<Utc>>,
    pub peer_count: Option<u64>,
    pub mining: Option<bool>,
    pub hashrate: Option<u64>,
}

/// Data loads the poller asks the (external) data layer to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRequest {
    /// Full application data reload after the daemon became reachable
    InitializeData,
    UpdateAssets,
    LoadEventsToReport,
    LoadPendingReports,
    LoadMarketCache,
}

/// Events emitted by the poller
#[derive(Debug, Clone, PartialEq)]
pub enum PollerEvent {
    UpdateEthereumStatus(NetworkStatus),
    UpdateNetwork(NetworkDelta),
    /// Age of the head block in seconds
    UpdateBlockChainAge(i64),
    UpdateAccount(AccountSnapshot),
    /// Endpoint selected after the daemon became reachable
    SetHost { url: String, is_hosted: bool },
    LoadData(DataRequest),
}

impl PollerEvent {
    /// Event name as the store layer knows it
    pub fn name(&self) -> &'static str {
        match self {
            PollerEvent::UpdateEthereumStatus(_) => "UPDATE_ETHEREUM_STATUS",
            PollerEvent::UpdateNetwork(_) => "UPDATE_NETWORK",
            PollerEvent::UpdateBlockChainAge(_) => "UPDATE_BLOCK_CHAIN_AGE",
            PollerEvent::UpdateAccount(_) => "UPDATE_ACCOUNT",
            PollerEvent::SetHost { .. } => "SET_HOST",
            PollerEvent::LoadData(_) => "LOAD_DATA",
        }
    }
}
