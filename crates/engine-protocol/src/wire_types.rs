//! Serde shapes of the external JSON documents.
//!
//! Field names follow the external contract exactly:
//! - operations use `snake_case` (`type_op`, `limit_price`, ...)
//! - trades use `camelCase` (`tradeId`, `buyOrderId`, ...)
//! - book orders carry their side in a field called `type`
//!
//! Every price and quantity leaving the engine is a fixed 8-digit
//! decimal string. Incoming amounts/prices may be JSON strings or numbers.

use engine_core::{
    render_fixed, BookSnapshot, CreateOrder, DeleteOrder, Operation, OperationOutcome,
    OperationStatus, OutputOrder, Side, Trade,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// One entry of an operations file, or a raw request from a JSON client.
///
/// Everything is optional at this level; [`IncomingOperation::into_operation`]
/// decides what is required for which `type_op`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomingOperation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(
        default,
        deserialize_with = "decimal_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<String>,
    #[serde(
        default,
        deserialize_with = "decimal_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit_price: Option<String>,
}

impl IncomingOperation {
    /// Convert to an engine operation.
    ///
    /// Only `type_op`, `order_id` and (for CREATE) `side` are checked
    /// here. Missing CREATE fields pass through empty so the engine
    /// reports them as validation failures.
    pub fn into_operation(self) -> Result<Operation, ProtocolError> {
        let type_op = self.type_op.ok_or(ProtocolError::MissingField("type_op"))?;
        let order_id = self.order_id.ok_or(ProtocolError::MissingField("order_id"))?;

        match type_op.trim().to_ascii_uppercase().as_str() {
            "CREATE" => {
                let side_text = self.side.ok_or(ProtocolError::MissingField("side"))?;
                let side: Side = side_text
                    .parse()
                    .map_err(|_| ProtocolError::InvalidSide(side_text.clone()))?;

                Ok(Operation::Create(CreateOrder {
                    order_id,
                    account_id: self.account_id.unwrap_or_default(),
                    pair: self.pair.unwrap_or_default(),
                    side,
                    amount: self.amount.unwrap_or_default(),
                    limit_price: self.limit_price.unwrap_or_default(),
                }))
            }
            "DELETE" => Ok(Operation::Delete(DeleteOrder { order_id })),
            _ => Err(ProtocolError::UnknownOperation(type_op)),
        }
    }

    pub fn from_operation(op: &Operation) -> Self {
        match op {
            Operation::Create(create) => IncomingOperation {
                type_op: Some("CREATE".to_string()),
                order_id: Some(create.order_id.clone()),
                account_id: Some(create.account_id.clone()),
                pair: Some(create.pair.clone()),
                side: Some(create.side.as_str().to_string()),
                amount: Some(create.amount.clone()),
                limit_price: Some(create.limit_price.clone()),
            },
            Operation::Delete(delete) => IncomingOperation {
                type_op: Some("DELETE".to_string()),
                order_id: Some(delete.order_id.clone()),
                ..IncomingOperation::default()
            },
        }
    }
}

/// Accept `"12.5"` or `12.5` and keep the text form.
fn decimal_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTrade {
    pub trade_id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub price: String,
    pub quantity: String,
    pub timestamp: i64,
}

impl From<&Trade> for WireTrade {
    fn from(trade: &Trade) -> Self {
        WireTrade {
            trade_id: trade.trade_id.clone(),
            buy_order_id: trade.buy_order_id.clone(),
            sell_order_id: trade.sell_order_id.clone(),
            price: render_fixed(trade.price),
            quantity: render_fixed(trade.quantity),
            timestamp: trade.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireOrder {
    pub order_id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub pair: String,
    #[serde(rename = "type")]
    pub side: String,
    pub price: String,
    pub quantity: String,
}

impl From<&OutputOrder> for WireOrder {
    fn from(order: &OutputOrder) -> Self {
        WireOrder {
            order_id: order.order_id.clone(),
            account_id: order.account_id.clone(),
            pair: order.pair.clone(),
            side: order.side.clone(),
            price: order.price.clone(),
            quantity: order.quantity.clone(),
        }
    }
}

impl From<WireOrder> for OutputOrder {
    fn from(order: WireOrder) -> Self {
        OutputOrder {
            order_id: order.order_id,
            account_id: order.account_id,
            pair: order.pair,
            side: order.side,
            price: order.price,
            quantity: order.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBook {
    #[serde(default)]
    pub bids: Vec<WireOrder>,
    #[serde(default)]
    pub asks: Vec<WireOrder>,
}

impl From<&BookSnapshot> for WireBook {
    fn from(snapshot: &BookSnapshot) -> Self {
        WireBook {
            bids: snapshot.bids.iter().map(WireOrder::from).collect(),
            asks: snapshot.asks.iter().map(WireOrder::from).collect(),
        }
    }
}

impl From<WireBook> for BookSnapshot {
    fn from(book: WireBook) -> Self {
        BookSnapshot {
            bids: book.bids.into_iter().map(OutputOrder::from).collect(),
            asks: book.asks.into_iter().map(OutputOrder::from).collect(),
        }
    }
}

/// Per-request acknowledgement sent back to the originating client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAck {
    pub order_id: String,

    /// `accepted`, `deleted`, `not_found` or `rejected`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resting: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub trades: usize,
}

impl From<&OperationOutcome> for WireAck {
    fn from(outcome: &OperationOutcome) -> Self {
        let mut ack = WireAck {
            order_id: outcome.order_id.clone(),
            status: String::new(),
            resting: None,
            remaining: None,
            reason: None,
            trades: outcome.trades.len(),
        };
        match &outcome.status {
            OperationStatus::Accepted { resting, remaining } => {
                ack.status = "accepted".to_string();
                ack.resting = Some(*resting);
                ack.remaining = Some(render_fixed(*remaining));
            }
            OperationStatus::Deleted => ack.status = "deleted".to_string(),
            OperationStatus::NotFound => ack.status = "not_found".to_string(),
            OperationStatus::Rejected(reason) => {
                ack.status = "rejected".to_string();
                ack.reason = Some(reason.to_string());
            }
        }
        ack
    }
}

/// Server → client JSON event: `{"type": "...", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum ServerEvent {
    Trades(Vec<WireTrade>),
    Orderbook(WireBook),
    Ack(WireAck),
    Error(String),
}

/// Client → server JSON request, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ClientRequest {
    /// Any CREATE or DELETE in the operations-file shape.
    Submit(IncomingOperation),

    /// Shorthand for a DELETE.
    Cancel { order_id: String },

    /// Ask for the current book.
    Book,

    /// Ask for the trade history.
    Trades,
}
