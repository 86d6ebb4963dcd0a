//! Network layer - daemon queries and the poller that drives them
//!
//! The poller owns the network snapshot, queries the daemon through an
//! [`EthRpc`] implementation and sends events to the App layer.

pub mod fsm;
pub mod poller;
pub mod rpc;

pub use poller::{Poller, PollerSettings, TickReport};
pub use rpc::{EthRpc, HttpRpc};
