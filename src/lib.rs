//! # chainwatch
//!
//! Watches an Ethereum JSON-RPC daemon for a prediction-market client.
//!
//! ## Features
//! - Edge-triggered liveness tracking (connect/initialize once per outage)
//! - Endpoint selection: local node first, hosted fallbacks otherwise
//! - Account resolution: client-held key, unlocked coinbase, or none
//! - Chain head, peer count and mining stats refresh every 3 seconds
//!
//! ## Architecture
//! Actor-based with channels:
//! - Network Layer (Tokio) - poller owning the snapshot
//! - App Layer - reducer mirroring the snapshot for readers

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod units;
pub mod messages;
pub mod app;
pub mod network;

// Re-export commonly used types
pub use config::Config;
pub use error::{Field, PollError, RpcError};
pub use models::{AccountSnapshot, ClientAccount, Endpoints, NetworkSnapshot, NetworkStatus};
pub use messages::{DataRequest, NetworkDelta, PollerEvent};
pub use app::{AppActor, AppState};
pub use network::{EthRpc, HttpRpc, Poller, PollerSettings, TickReport};
