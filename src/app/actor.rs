//! App actor - message loop reducing poller events into published snapshots

use tokio::sync::{mpsc, watch};

use crate::app::state::AppState;
use crate::messages::PollerEvent;

/// Store actor: mirrors the poller's snapshot for readers
pub struct AppActor {
    state: AppState,
    snapshot_tx: watch::Sender<AppState>,
}

impl AppActor {
    pub fn new() -> (Self, watch::Receiver<AppState>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(AppState::new());
        let actor = AppActor {
            state: AppState::new(),
            snapshot_tx,
        };
        (actor, snapshot_rx)
    }

    /// Run the actor message loop until the poller drops its sender
    pub async fn run(mut self, mut events_rx: mpsc::UnboundedReceiver<PollerEvent>) {
        while let Some(event) = events_rx.recv().await {
            self.handle_event(&event);
            let _ = self.snapshot_tx.send(self.state.clone());
        }
        tracing::debug!("event channel closed, store actor stopping");
    }

    fn handle_event(&mut self, event: &PollerEvent) {
        if self.state.apply(event) {
            tracing::info!(status = %self.state.network.status, "Ethereum status changed");
        }
        match event {
            PollerEvent::LoadData(request) => {
                tracing::info!(?request, "Data load requested");
            }
            PollerEvent::SetHost { url, is_hosted } => {
                tracing::info!(%url, is_hosted, "Host set");
            }
            other => tracing::trace!(event = other.name(), "Applied event"),
        }
    }
}
