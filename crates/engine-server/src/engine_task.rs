//! Central engine loop.
//!
//! This task owns the `MatchingEngine` and the trade history and
//! processes every `EngineRequest`, one at a time.
//!
//! Routing policy:
//! - acks, errors and query answers: sent **only** to the originating client.
//! - new trades and the updated book: broadcast to **all** connected clients.
//! - a newly connected client gets the current book and trade history.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use engine_core::{DeleteOrder, MatchingEngine, Operation};
use engine_protocol::json_codec::trades_to_wire;
use engine_protocol::{ClientRequest, ServerEvent, WireAck, WireBook, WireTrade};
use tracing::{debug, error, info, warn};

use crate::persistence;
use crate::types::{ClientId, ClientRegistry, EngineRequest, EngineRx, OutboundTx};

/// Who an event goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Origin,
    All,
}

/// Everything the engine task owns.
#[derive(Debug, Default)]
pub struct EngineState {
    engine: MatchingEngine,
    trades: Vec<WireTrade>,
}

impl EngineState {
    pub fn new(engine: MatchingEngine, trades: Vec<WireTrade>) -> Self {
        EngineState { engine, trades }
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    pub fn trades(&self) -> &[WireTrade] {
        &self.trades
    }

    /// Apply one client request and return the events it produces.
    pub fn handle(&mut self, request: ClientRequest) -> Vec<(Target, ServerEvent)> {
        let op = match request {
            ClientRequest::Book => return vec![(Target::Origin, self.book_event())],
            ClientRequest::Trades => return vec![(Target::Origin, self.trades_event())],
            ClientRequest::Cancel { order_id } => Operation::Delete(DeleteOrder { order_id }),
            ClientRequest::Submit(incoming) => match incoming.into_operation() {
                Ok(op) => op,
                Err(e) => {
                    warn!(error = %e, "undecodable operation");
                    return vec![(Target::Origin, ServerEvent::Error(e.to_string()))];
                }
            },
        };

        let outcome = self.engine.process_operation(op);
        let mut events = vec![(Target::Origin, ServerEvent::Ack(WireAck::from(&outcome)))];

        if !outcome.trades.is_empty() {
            let new_trades = trades_to_wire(&outcome.trades);
            self.trades.extend(new_trades.iter().cloned());
            events.push((Target::All, ServerEvent::Trades(new_trades)));
        }
        if outcome.mutated_book() {
            let top = self.engine.top_of_book();
            debug!(
                best_bid = ?top.best_bid.map(|l| l.price),
                best_ask = ?top.best_ask.map(|l| l.price),
                spread = ?top.spread(),
                "top of book"
            );
            events.push((Target::All, self.book_event()));
        }

        events
    }

    /// Initial state for a new subscriber.
    pub fn welcome(&self) -> Vec<ServerEvent> {
        vec![self.book_event(), self.trades_event()]
    }

    fn book_event(&self) -> ServerEvent {
        ServerEvent::Orderbook(WireBook::from(&self.engine.snapshot()))
    }

    fn trades_event(&self) -> ServerEvent {
        ServerEvent::Trades(self.trades.clone())
    }
}

/// Run the central engine processing loop.
///
/// - `engine_rx`: receives requests from all client tasks.
/// - `clients`: registry of connected clients and their outbound channels.
/// - `data_dir`: where state is written on shutdown.
pub async fn run_engine_loop(
    mut engine_rx: EngineRx,
    clients: ClientRegistry,
    mut state: EngineState,
    data_dir: PathBuf,
) {
    while let Some(req) = engine_rx.recv().await {
        match req {
            EngineRequest::Client { client_id, request } => {
                debug!(client = client_id.0, ?request, "engine request");
                let events = state.handle(request);

                // Snapshot of current clients to minimize lock hold time.
                let current_clients = {
                    let guard = clients.read().await;
                    guard.clone()
                };
                for (target, event) in events {
                    route_event(client_id, target, Arc::new(event), &current_clients);
                }
            }
            EngineRequest::Connected { client_id } => {
                let guard = clients.read().await;
                if let Some(tx) = guard.get(&client_id) {
                    for event in state.welcome() {
                        let _ = tx.send(Arc::new(event));
                    }
                }
            }
            EngineRequest::Shutdown { done } => {
                save(&state, &data_dir).await;
                let _ = done.send(());
                info!("engine loop stopped");
                return;
            }
        }
    }

    // All senders gone without an explicit shutdown.
    save(&state, &data_dir).await;
    info!("engine loop shutting down (engine_rx closed)");
}

async fn save(state: &EngineState, data_dir: &Path) {
    if let Err(e) =
        persistence::save_state(data_dir, &state.engine.snapshot(), &state.trades).await
    {
        error!("failed to persist state: {e:#}");
    }
}

/// Route a single event to the appropriate client(s).
fn route_event(
    origin_client: ClientId,
    target: Target,
    event: Arc<ServerEvent>,
    clients: &HashMap<ClientId, OutboundTx>,
) {
    match target {
        Target::Origin => {
            if let Some(tx) = clients.get(&origin_client) {
                let _ = tx.send(event);
            }
        }
        Target::All => {
            for tx in clients.values() {
                let _ = tx.send(event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_protocol::IncomingOperation;

    fn submit(id: &str, account: &str, side: &str, amount: &str, price: &str) -> ClientRequest {
        ClientRequest::Submit(IncomingOperation {
            type_op: Some("CREATE".to_string()),
            order_id: Some(id.to_string()),
            account_id: Some(account.to_string()),
            pair: Some("BTC/USD".to_string()),
            side: Some(side.to_string()),
            amount: Some(amount.to_string()),
            limit_price: Some(price.to_string()),
        })
    }

    #[test]
    fn resting_order_acks_origin_and_broadcasts_book() {
        let mut state = EngineState::default();
        let events = state.handle(submit("b1", "a", "BUY", "1", "100"));

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], (Target::Origin, ServerEvent::Ack(ack)) if ack.status == "accepted"));
        assert!(matches!(&events[1], (Target::All, ServerEvent::Orderbook(book)) if book.bids.len() == 1));
    }

    #[test]
    fn trades_are_broadcast_and_recorded() {
        let mut state = EngineState::default();
        state.handle(submit("s1", "a", "SELL", "2", "100"));
        let events = state.handle(submit("b1", "b", "BUY", "1", "101"));

        let targets: Vec<_> = events.iter().map(|(t, _)| *t).collect();
        assert_eq!(targets, vec![Target::Origin, Target::All, Target::All]);
        let (_, ServerEvent::Trades(trades)) = &events[1] else {
            panic!("expected trades event");
        };
        assert_eq!(trades[0].price, "100.00000000");
        assert_eq!(state.trades().len(), 1);
    }

    #[test]
    fn unknown_cancel_only_answers_origin() {
        let mut state = EngineState::default();
        let events = state.handle(ClientRequest::Cancel {
            order_id: "nope".to_string(),
        });
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], (Target::Origin, ServerEvent::Ack(ack)) if ack.status == "not_found"));
    }

    #[test]
    fn undecodable_submit_is_an_error_event() {
        let mut state = EngineState::default();
        let events = state.handle(ClientRequest::Submit(IncomingOperation::default()));
        assert!(matches!(&events[..], [(Target::Origin, ServerEvent::Error(_))]));
    }

    #[test]
    fn queries_and_welcome() {
        let mut state = EngineState::default();
        state.handle(submit("s1", "a", "SELL", "1", "100"));

        assert!(matches!(
            &state.handle(ClientRequest::Book)[..],
            [(Target::Origin, ServerEvent::Orderbook(_))]
        ));
        let welcome = state.welcome();
        assert!(matches!(&welcome[0], ServerEvent::Orderbook(book) if book.asks.len() == 1));
        assert!(matches!(&welcome[1], ServerEvent::Trades(trades) if trades.is_empty()));
    }
}
