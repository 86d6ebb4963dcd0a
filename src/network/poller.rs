//! Network poller - recurring liveness, account and chain-head checks
//!
//! Each tick asks the daemon whether it is listening and feeds the answer
//! through the transition table in [`crate::network::fsm`]. The CONNECTED edge
//! selects an endpoint and runs the one-time initialize sequence; every
//! reachable tick refreshes the chain head. Query failures withhold a single
//! field and never abort the tick.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::app::AppState;
use crate::constants::{MAX_BLOCKCHAIN_AGE_SECS, POLL_INTERVAL};
use crate::error::{Field, PollError, RpcError};
use crate::messages::{DataRequest, NetworkDelta, PollerEvent};
use crate::models::{AccountSnapshot, AccountSource, Block, ClientAccount, Endpoints, NetworkStatus};
use crate::network::fsm::{transition, Edge};
use crate::network::rpc::EthRpc;

/// Poller inputs that do not change while it runs
#[derive(Clone, Debug)]
pub struct PollerSettings {
    pub endpoints: Endpoints,
    pub client_account: Option<ClientAccount>,
    pub use_market_cache: bool,
    /// Staleness threshold in seconds
    pub max_blockchain_age_secs: i64,
}

impl Default for PollerSettings {
    fn default() -> Self {
        PollerSettings {
            endpoints: Endpoints::default(),
            client_account: None,
            use_market_cache: false,
            max_blockchain_age_secs: MAX_BLOCKCHAIN_AGE_SECS,
        }
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub status: NetworkStatus,
    /// The CONNECTED edge fired during this tick
    pub connected: bool,
    /// Everything that was absorbed instead of updating the snapshot
    pub degraded: Vec<PollError>,
    pub next_tick: Duration,
}

enum AccountResolution {
    ClientKey(ClientAccount),
    Unlocked(String),
    Unavailable(PollError),
}

/// Owns the network snapshot and keeps it in sync with the daemon
pub struct Poller<R: EthRpc> {
    rpc: R,
    settings: PollerSettings,
    state: AppState,
    events_tx: mpsc::UnboundedSender<PollerEvent>,
}

impl<R: EthRpc> Poller<R> {
    pub fn new(
        rpc: R,
        settings: PollerSettings,
        events_tx: mpsc::UnboundedSender<PollerEvent>,
    ) -> Self {
        Poller {
            rpc,
            settings,
            state: AppState::new(),
            events_tx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Tick forever, sleeping the fixed interval between ticks
    pub async fn run(mut self) {
        loop {
            let report = self.tick().await;
            tracing::trace!(
                status = %report.status,
                degraded = report.degraded.len(),
                "Tick complete"
            );
            tokio::time::sleep(report.next_tick).await;
        }
    }

    /// Run one poll cycle
    pub async fn tick(&mut self) -> TickReport {
        let mut degraded = Vec::new();
        let reachable = self.rpc.listening().await;
        let (next, edge) = transition(self.state.network.status, reachable);

        match edge {
            Some(Edge::ReportDown) => {
                tracing::warn!(endpoint = %self.rpc.endpoint(), "failed to connect to ethereum");
                degraded.push(PollError::Unreachable);
                self.dispatch(PollerEvent::UpdateEthereumStatus(next));
            }
            Some(Edge::Connect) => {
                tracing::info!(endpoint = %self.rpc.endpoint(), "Ethereum daemon reachable");
                self.dispatch(PollerEvent::UpdateEthereumStatus(next));
                self.select_host();
                self.initialize_network(&mut degraded).await;
                self.dispatch(PollerEvent::LoadData(DataRequest::InitializeData));
            }
            None => {}
        }

        if reachable {
            self.update_network(&mut degraded).await;
        }

        TickReport {
            status: self.state.network.status,
            connected: edge == Some(Edge::Connect),
            degraded,
            next_tick: POLL_INTERVAL,
        }
    }

    fn dispatch(&mut self, event: PollerEvent) {
        self.state.apply(&event);
        // Consumers may be gone; the snapshot here stays authoritative.
        let _ = self.events_tx.send(event);
    }

    fn select_host(&mut self) {
        let Some(url) = self.settings.endpoints.select().map(str::to_string) else {
            tracing::warn!("no endpoint configured, keeping {}", self.rpc.endpoint());
            return;
        };
        let is_hosted = self.settings.endpoints.is_hosted(&url);
        tracing::info!(%url, is_hosted, "Selected endpoint");
        self.rpc.use_endpoint(&url);
        self.dispatch(PollerEvent::SetHost { url, is_hosted });
    }

    async fn initialize_network(&mut self, degraded: &mut Vec<PollError>) {
        let is_hosted = self.state.host.is_hosted;
        let client_account = self.settings.client_account.clone();
        let rpc = &self.rpc;

        let (network_id, client_version, account, gas_price) = tokio::join!(
            rpc.network_id(),
            rpc.client_version(),
            resolve_account(rpc, client_account, is_hosted),
            rpc.gas_price(),
        );

        match network_id {
            Ok(id) => self.dispatch(PollerEvent::UpdateNetwork(NetworkDelta {
                network_id: Some(id),
                ..Default::default()
            })),
            Err(e) => degraded.push(absorb(Field::NetworkId, e)),
        }
        match client_version {
            Ok(version) => self.dispatch(PollerEvent::UpdateNetwork(NetworkDelta {
                client_version: Some(version),
                ..Default::default()
            })),
            Err(e) => degraded.push(absorb(Field::ClientVersion, e)),
        }
        self.adopt_account(account, degraded);
        match gas_price {
            Ok(wei) => self.dispatch(PollerEvent::UpdateNetwork(NetworkDelta {
                gas_price: Some(crate::units::format_ether(wei)),
                ..Default::default()
            })),
            Err(e) => degraded.push(absorb(Field::GasPrice, e)),
        }
    }

    fn adopt_account(&mut self, resolution: AccountResolution, degraded: &mut Vec<PollError>) {
        match resolution {
            AccountResolution::ClientKey(account) => {
                tracing::info!(address = %account.address, "using client-side account");
                self.dispatch(PollerEvent::UpdateAccount(AccountSnapshot {
                    address: Some(account.address),
                    unlocked: true,
                    source: Some(AccountSource::ClientKey),
                    handle: account.handle,
                }));
                self.dispatch(PollerEvent::LoadData(DataRequest::UpdateAssets));
                self.dispatch(PollerEvent::LoadData(DataRequest::LoadEventsToReport));
                self.dispatch(PollerEvent::LoadData(DataRequest::LoadPendingReports));
                if self.settings.use_market_cache {
                    self.dispatch(PollerEvent::LoadData(DataRequest::LoadMarketCache));
                }
            }
            AccountResolution::Unlocked(address) => {
                tracing::info!(%address, "using unlocked account");
                self.dispatch(PollerEvent::UpdateAccount(AccountSnapshot {
                    address: Some(address),
                    unlocked: true,
                    source: Some(AccountSource::Node),
                    handle: None,
                }));
            }
            AccountResolution::Unavailable(reason) => {
                tracing::info!(%reason, "no account available");
                // Drop any account adopted before the outage.
                self.dispatch(PollerEvent::UpdateAccount(AccountSnapshot::default()));
                self.dispatch(PollerEvent::UpdateEthereumStatus(NetworkStatus::NoAccount));
                degraded.push(reason);
            }
        }
    }

    /// Refresh block head and peers, plus mining stats once the chain is current
    async fn update_network(&mut self, degraded: &mut Vec<PollError>) {
        let poll_mining = matches!(
            self.state.network.block_chain_age,
            Some(age) if age < self.settings.max_blockchain_age_secs
        );
        let rpc = &self.rpc;

        let (head, peer_count, mining) = tokio::join!(
            fetch_head(rpc),
            rpc.peer_count(),
            async {
                if poll_mining {
                    Some(tokio::join!(rpc.mining(), rpc.hashrate()))
                } else {
                    None
                }
            },
        );

        match head {
            Ok((number, block)) => {
                self.dispatch(PollerEvent::UpdateNetwork(NetworkDelta {
                    block_number: Some(number),
                    ..Default::default()
                }));
                match block {
                    Ok(block) => {
                        let age = Utc::now().timestamp() - block.timestamp;
                        self.dispatch(PollerEvent::UpdateNetwork(NetworkDelta {
                            block_time: DateTime::from_timestamp(block.timestamp, 0),
                            ..Default::default()
                        }));
                        self.dispatch(PollerEvent::UpdateBlockChainAge(age));
                    }
                    Err(e) => degraded.push(absorb(Field::Block, e)),
                }
            }
            Err(e) => degraded.push(absorb(Field::BlockNumber, e)),
        }

        match peer_count {
            Ok(peers) => self.dispatch(PollerEvent::UpdateNetwork(NetworkDelta {
                peer_count: Some(peers),
                ..Default::default()
            })),
            Err(e) => degraded.push(absorb(Field::PeerCount, e)),
        }

        if let Some((mining, hashrate)) = mining {
            match mining {
                Ok(mining) => self.dispatch(PollerEvent::UpdateNetwork(NetworkDelta {
                    mining: Some(mining),
                    ..Default::default()
                })),
                Err(e) => degraded.push(absorb(Field::Mining, e)),
            }
            match hashrate {
                Ok(hashrate) => self.dispatch(PollerEvent::UpdateNetwork(NetworkDelta {
                    hashrate: Some(hashrate),
                    ..Default::default()
                })),
                Err(e) => degraded.push(absorb(Field::Hashrate, e)),
            }
        }
    }
}

fn absorb(field: Field, source: RpcError) -> PollError {
    tracing::debug!(%field, error = %source, "query failed, field not updated");
    PollError::query(field, source)
}

async fn resolve_account<R: EthRpc + ?Sized>(
    rpc: &R,
    client_account: Option<ClientAccount>,
    is_hosted: bool,
) -> AccountResolution {
    if let Some(account) = client_account {
        return AccountResolution::ClientKey(account);
    }
    if is_hosted {
        return AccountResolution::Unavailable(PollError::NoAccountAvailable);
    }

    let coinbase = match rpc.coinbase().await {
        Ok(coinbase) => coinbase,
        Err(e) => return AccountResolution::Unavailable(absorb(Field::Coinbase, e)),
    };
    match rpc.unlocked(&coinbase).await {
        Ok(true) => AccountResolution::Unlocked(coinbase),
        Ok(false) => AccountResolution::Unavailable(PollError::AccountLocked(coinbase)),
        Err(e) => AccountResolution::Unavailable(absorb(Field::Unlocked, e)),
    }
}

async fn fetch_head<R: EthRpc + ?Sized>(
    rpc: &R,
) -> Result<(u64, Result<Block, RpcError>), RpcError> {
    let number = rpc.block_number().await?;
    let block = rpc.get_block(number, true).await;
    Ok((number, block))
}
