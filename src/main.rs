//! chainwatch - Ethereum daemon status poller
//!
//! Architecture:
//! - Network Layer (Tokio) - poller querying the daemon every 3 seconds
//! - App Layer - store actor reducing poller events into snapshots
//! - Main loop - prints snapshot changes to stdout

use std::path::PathBuf;

use anyhow::Context;
use tokio::sync::mpsc;

use chainwatch::constants::{APP_NAME, APP_VERSION};
use chainwatch::{AppActor, AppState, Config, HttpRpc, Poller, PollerEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);
    let config = Config::load_from(&config_path)?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", &config.log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    tracing::info!(version = APP_VERSION, config = %config_path.display(), "Starting {}", APP_NAME);

    let endpoint = config
        .endpoints
        .select()
        .context("no daemon endpoint configured")?;
    let rpc = HttpRpc::new(endpoint, config.request_timeout());

    // Create channels
    let (events_tx, events_rx) = mpsc::unbounded_channel::<PollerEvent>();

    // Spawn app actor
    let (app_actor, mut snapshot_rx) = AppActor::new();
    tokio::spawn(app_actor.run(events_rx));

    // Spawn poller
    let poller = Poller::new(rpc, config.poller_settings(), events_tx);
    tokio::spawn(poller.run());

    println!("{} {} watching {}", APP_NAME, APP_VERSION, endpoint);

    let mut last_printed: Option<AppState> = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = snapshot_rx.borrow_and_update().clone();
                if worth_printing(last_printed.as_ref(), &state) {
                    println!("{}", status_line(&state));
                    last_printed = Some(state);
                }
            }
        }
    }

    Ok(())
}

/// Only status, host, head and account changes are printed
fn worth_printing(previous: Option<&AppState>, current: &AppState) -> bool {
    match previous {
        None => true,
        Some(prev) => {
            prev.network.status != current.network.status
                || prev.network.block_number != current.network.block_number
                || prev.host != current.host
                || prev.account != current.account
        }
    }
}

fn status_line(state: &AppState) -> String {
    let net = &state.network;
    let dash = || String::from("-");
    format!(
        "[{}] host={} net={} block={} age={}s peers={} gas={} account={}",
        net.status,
        state.host.host.clone().unwrap_or_else(dash),
        net.network_id.clone().unwrap_or_else(dash),
        net.block_number.map(|n| n.to_string()).unwrap_or_else(dash),
        net.block_chain_age.map(|a| a.to_string()).unwrap_or_else(dash),
        net.peer_count.map(|p| p.to_string()).unwrap_or_else(dash),
        net.gas_price.clone().unwrap_or_else(dash),
        state.account.address.clone().unwrap_or_else(dash),
    )
}
