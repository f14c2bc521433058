// crates/engine-server/src/client.rs

//! Per-connection I/O.
//!
//! The protocol is picked from the first byte the client sends:
//! `{` means JSON lines, anything else is the CSV line protocol.
//! Outbound events are rendered in the same protocol.

use std::sync::Arc;

use anyhow::Result;
use engine_protocol::{csv_codec, json_codec, ClientRequest, ProtocolError, ServerEvent};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::types::{ClientId, ClientRegistry, EngineRequest, EngineTx, OutboundRx, OutboundTx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Json,
    Csv,
}

impl Protocol {
    pub fn detect(first_byte: u8) -> Self {
        if first_byte == b'{' {
            Protocol::Json
        } else {
            Protocol::Csv
        }
    }

    fn decode(self, line: &str) -> Result<Option<ClientRequest>, ProtocolError> {
        match self {
            Protocol::Json => json_codec::decode_request(line).map(Some),
            Protocol::Csv => csv_codec::parse_input_line(line),
        }
    }

    /// Render one event as zero or more lines.
    pub fn render(self, event: &ServerEvent) -> Vec<String> {
        match self {
            Protocol::Json => match json_codec::encode_event(event) {
                Ok(line) => vec![line],
                Err(e) => {
                    warn!(error = %e, "failed to encode event");
                    Vec::new()
                }
            },
            Protocol::Csv => match event {
                ServerEvent::Trades(trades) => trades.iter().map(csv_codec::format_trade).collect(),
                ServerEvent::Orderbook(book) => csv_codec::format_book(book),
                ServerEvent::Ack(ack) => vec![csv_codec::format_ack(ack)],
                ServerEvent::Error(message) => vec![csv_codec::format_error(message)],
            },
        }
    }
}

/// Run the client I/O loop for a single connection.
pub async fn run_client(
    client_id: ClientId,
    stream: TcpStream,
    engine_tx: EngineTx,
    out_tx: OutboundTx,
    out_rx: OutboundRx,
    clients: ClientRegistry,
) -> Result<()> {
    let (read_stream, write_stream) = stream.into_split();
    let mut reader = BufReader::new(read_stream);

    // Peek at the first byte without consuming it. An empty buffer means
    // the client closed before sending anything; CSV is as good as any.
    let protocol = match reader.fill_buf().await {
        Ok(buf) if !buf.is_empty() => Protocol::detect(buf[0]),
        _ => Protocol::Csv,
    };
    info!(client = client_id.0, ?protocol, "client protocol detected");

    let writer_handle = tokio::spawn(run_writer(client_id, protocol, write_stream, out_rx));

    let result = run_reader(client_id, protocol, reader, &engine_tx, &out_tx).await;

    // Remove client from registry; this also lets the writer drain and stop.
    {
        let mut guard = clients.write().await;
        guard.remove(&client_id);
    }
    drop(out_tx);
    let _ = writer_handle.await;

    result
}

async fn run_reader(
    client_id: ClientId,
    protocol: Protocol,
    reader: BufReader<OwnedReadHalf>,
    engine_tx: &EngineTx,
    out_tx: &OutboundTx,
) -> Result<()> {
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(client = client_id.0, line, "received");

        match protocol.decode(line) {
            Ok(Some(request)) => {
                let req = EngineRequest::Client { client_id, request };
                if engine_tx.send(req).is_err() {
                    warn!("engine channel closed");
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(client = client_id.0, error = %e, line, "invalid request");
                let _ = out_tx.send(Arc::new(ServerEvent::Error(e.to_string())));
            }
        }
    }

    info!(client = client_id.0, "client disconnected");
    Ok(())
}

async fn run_writer(
    client_id: ClientId,
    protocol: Protocol,
    mut write_stream: OwnedWriteHalf,
    mut out_rx: OutboundRx,
) {
    while let Some(event) = out_rx.recv().await {
        for line in protocol.render(&event) {
            if let Err(e) = write_line(&mut write_stream, &line).await {
                warn!(client = client_id.0, error = %e, "write error");
                return;
            }
        }
    }
}

async fn write_line(stream: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.flush().await
}
