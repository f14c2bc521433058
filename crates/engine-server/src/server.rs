//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Loads persisted book and trades from the data directory.
//! - Listens on the configured address/port.
//! - Accepts new TCP connections and assigns each a `ClientId`.
//! - Spawns:
//!   - a per-client task to handle I/O,
//!   - a single central engine task that owns `MatchingEngine`.
//! - On Ctrl-C or SIGTERM, asks the engine task to persist state and exits.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use engine_core::MatchingEngine;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{error, info, warn};

use crate::client;
use crate::config::Config;
use crate::engine_task::{self, EngineState};
use crate::persistence;
use crate::types::{
    ClientId, ClientRegistry, EngineRequest, EngineRx, EngineTx, OutboundRx, OutboundTx,
};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> ClientId {
    let id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    ClientId(id)
}

/// Build the engine from `config` and whatever is on disk.
pub async fn load_engine_state(config: &Config) -> Result<EngineState> {
    let persisted = persistence::load_state(&config.data_dir).await?;

    let mut engine = match &config.pair {
        Some(pair) => MatchingEngine::for_pair(pair.clone()),
        None => MatchingEngine::new(),
    };
    if let Some(book) = &persisted.book {
        let report = engine.restore(book);
        for warning in &report.skipped {
            warn!("{warning}");
        }
    }

    Ok(EngineState::new(engine, persisted.trades))
}

/// Run the TCP server until Ctrl-C or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    run_until(config, shutdown_signal()).await
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C"),
        () = terminate => info!("received SIGTERM"),
    }
}

/// Run the TCP server until `shutdown` resolves, then save state.
pub async fn run_until<F>(config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let state = load_engine_state(&config).await?;
    info!(
        live_orders = state.engine().book().len(),
        trades = state.trades().len(),
        pair = config.pair.as_deref().unwrap_or("*"),
        "engine ready"
    );

    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, max_clients = config.max_clients, "listening");

    // Shared registry of clients → outbound channels.
    let clients: ClientRegistry = Arc::new(RwLock::new(Default::default()));

    // Channel from clients → engine task.
    let (engine_tx, engine_rx): (EngineTx, EngineRx) = mpsc::unbounded_channel();

    // Spawn the central engine task.
    let engine_handle = {
        let clients_clone = clients.clone();
        let data_dir = config.data_dir.clone();
        tokio::spawn(async move {
            engine_task::run_engine_loop(engine_rx, clients_clone, state, data_dir).await;
        })
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                accept_client(&config, &clients, &engine_tx, stream, peer_addr).await;
            }
        }
    }

    let (done_tx, done_rx) = oneshot::channel();
    if engine_tx.send(EngineRequest::Shutdown { done: done_tx }).is_ok() {
        let _ = done_rx.await;
    }
    let _ = engine_handle.await;
    Ok(())
}

async fn accept_client(
    config: &Config,
    clients: &ClientRegistry,
    engine_tx: &EngineTx,
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
) {
    let current_clients = {
        let guard = clients.read().await;
        guard.len()
    };

    if current_clients >= config.max_clients {
        warn!(
            %peer_addr,
            max_clients = config.max_clients,
            "rejecting connection: max_clients reached"
        );
        // Just drop the stream; client will see connection closed.
        return;
    }

    let client_id = next_client_id();
    info!(client = client_id.0, %peer_addr, "accepted connection");

    // Create outbound channel for this client.
    let (out_tx, out_rx): (OutboundTx, OutboundRx) = mpsc::unbounded_channel();

    // Register client, then let the engine greet it with the current state.
    {
        let mut guard = clients.write().await;
        guard.insert(client_id, out_tx.clone());
    }
    let _ = engine_tx.send(EngineRequest::Connected { client_id });

    // Clone handles to move into the client task.
    let clients_clone = clients.clone();
    let engine_tx_clone = engine_tx.clone();

    tokio::spawn(async move {
        if let Err(e) = client::run_client(
            client_id,
            stream,
            engine_tx_clone,
            out_tx,
            out_rx,
            clients_clone,
        )
        .await
        {
            warn!(client = client_id.0, error = %e, "client error");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{ORDERBOOK_FILE, TRADES_FILE};
    use engine_core::{BookSnapshot, OutputOrder};

    fn scratch_config(name: &str) -> Config {
        let data_dir =
            std::env::temp_dir().join(format!("engine-server-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&data_dir);
        Config {
            bind_addr: "127.0.0.1".to_string(),
            port: 0,
            data_dir,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn shutdown_future_saves_state() {
        let config = scratch_config("shutdown");
        let dir = config.data_dir.clone();

        run_until(config, async {}).await.unwrap();

        assert!(dir.join(ORDERBOOK_FILE).exists());
        assert!(dir.join(TRADES_FILE).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn restarted_server_keeps_book() {
        let config = scratch_config("restart");
        let dir = config.data_dir.clone();
        let book = BookSnapshot {
            bids: Vec::new(),
            asks: vec![OutputOrder {
                order_id: "a1".to_string(),
                account_id: "acc".to_string(),
                pair: "BTC/USD".to_string(),
                side: "SELL".to_string(),
                price: "101.00000000".to_string(),
                quantity: "2.00000000".to_string(),
            }],
        };
        persistence::save_state(&dir, &book, &[]).await.unwrap();

        run_until(config.clone(), async {}).await.unwrap();
        let state = load_engine_state(&config).await.unwrap();
        assert_eq!(state.engine().snapshot(), book);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
