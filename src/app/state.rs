//! App state - owned snapshot and the single reducer that mutates it

use crate::messages::{NetworkDelta, PollerEvent};
use crate::models::{AccountSnapshot, HostState, NetworkSnapshot};

/// Everything downstream consumers read, replaced only through `apply`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub network: NetworkSnapshot,
    pub account: AccountSnapshot,
    pub host: HostState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one event into the snapshot. Returns true when the status changed.
    pub fn apply(&mut self, event: &PollerEvent) -> bool {
        match event {
            PollerEvent::UpdateEthereumStatus(status) => {
                let changed = self.network.status != *status;
                self.network.status = *status;
                return changed;
            }
            PollerEvent::UpdateNetwork(delta) => self.merge_network(delta),
            PollerEvent::UpdateBlockChainAge(age) => self.network.block_chain_age = Some(*age),
            PollerEvent::UpdateAccount(account) => self.account = account.clone(),
            PollerEvent::SetHost { url, is_hosted } => {
                self.host = HostState {
                    host: Some(url.clone()),
                    is_hosted: *is_hosted,
                };
            }
            PollerEvent::LoadData(_) => {}
        }
        false
    }

    fn merge_network(&mut self, delta: &NetworkDelta) {
        let net = &mut self.network;
        if let Some(v) = &delta.network_id {
            net.network_id = Some(v.clone());
        }
        if let Some(v) = &delta.client_version {
            net.client_version = Some(v.clone());
        }
        if let Some(v) = &delta.gas_price {
            net.gas_price = Some(v.clone());
        }
        if delta.block_number.is_some() {
            net.block_number = delta.block_number;
        }
        if delta.block_time.is_some() {
            net.block_time = delta.block_time;
        }
        if delta.peer_count.is_some() {
            net.peer_count = delta.peer_count;
        }
        if delta.mining.is_some() {
            net.mining = delta.mining;
        }
        if delta.hashrate.is_some() {
            net.hashrate = delta.hashrate;
        }
    }
}
