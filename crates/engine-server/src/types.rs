//! Shared types for the engine TCP server.
//!
//! This module defines:
//! - `ClientId`: a lightweight handle for connected clients
//! - channel aliases between clients and the engine loop
//! - `EngineRequest`: messages flowing from clients to the engine

use std::collections::HashMap;
use std::sync::Arc;

use engine_protocol::{ClientRequest, ServerEvent};
use tokio::sync::{mpsc, oneshot, RwLock};

/// Identifier for a connected client.
///
/// This is intentionally opaque; we just guarantee uniqueness
/// over the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

/// Outbound events from the engine to a given client.
///
/// Shared so a broadcast book is built once, not once per client.
pub type OutboundTx = mpsc::UnboundedSender<Arc<ServerEvent>>;
pub type OutboundRx = mpsc::UnboundedReceiver<Arc<ServerEvent>>;

/// Registry of connected clients and their outbound channels.
pub type ClientRegistry = Arc<RwLock<HashMap<ClientId, OutboundTx>>>;

/// Message flowing into the central engine task.
#[derive(Debug)]
pub enum EngineRequest {
    /// A decoded request from a client.
    Client {
        client_id: ClientId,
        request: ClientRequest,
    },

    /// A client was just registered and should receive the current state.
    Connected { client_id: ClientId },

    /// Persist state and stop. `done` fires once the files are written.
    Shutdown { done: oneshot::Sender<()> },
}

/// Channel from clients → engine task.
pub type EngineTx = mpsc::UnboundedSender<EngineRequest>;
pub type EngineRx = mpsc::UnboundedReceiver<EngineRequest>;
