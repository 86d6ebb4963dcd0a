//! Edge-triggered liveness state machine.
//!
//! Status only moves on observed liveness changes. The CONNECTED edge, which
//! triggers network initialization, fires once per down-to-up transition.

use crate::models::NetworkStatus;

/// Side effect attached to a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Daemon is unreachable: warn and report FAILED
    ReportDown,
    /// Daemon just became reachable: connect and initialize
    Connect,
}

/// (previous status, reachable) -> (next status, edge)
const TRANSITIONS: [(NetworkStatus, bool, NetworkStatus, Option<Edge>); 8] = [
    (NetworkStatus::Disconnected, false, NetworkStatus::Failed, Some(Edge::ReportDown)),
    (NetworkStatus::Failed, false, NetworkStatus::Failed, Some(Edge::ReportDown)),
    (NetworkStatus::Connected, false, NetworkStatus::Failed, Some(Edge::ReportDown)),
    (NetworkStatus::NoAccount, false, NetworkStatus::Failed, Some(Edge::ReportDown)),
    (NetworkStatus::Disconnected, true, NetworkStatus::Connected, Some(Edge::Connect)),
    (NetworkStatus::Failed, true, NetworkStatus::Connected, Some(Edge::Connect)),
    (NetworkStatus::Connected, true, NetworkStatus::Connected, None),
    (NetworkStatus::NoAccount, true, NetworkStatus::NoAccount, None),
];

/// Look up the transition for one liveness observation
pub fn transition(previous: NetworkStatus, reachable: bool) -> (NetworkStatus, Option<Edge>) {
    TRANSITIONS
        .iter()
        .find(|(from, up, _, _)| *from == previous && *up == reachable)
        .map(|(_, _, to, edge)| (*to, *edge))
        // Every (status, bool) pair is listed above.
        .unwrap_or((previous, None))
}
