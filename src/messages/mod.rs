//! Message types for communication between the poller and the store layer.

pub mod network;

pub use network::{DataRequest, NetworkDelta, PollerEvent};
