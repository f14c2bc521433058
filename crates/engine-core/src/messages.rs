//! Message types used by the core matching engine.
//!
//! These are **transport-agnostic** logical messages:
//! - [`Operation`]: what the engine consumes (CREATE / DELETE).
//! - [`Trade`] and [`OperationOutcome`]: what the engine produces.
//!
//! Amounts and prices arrive as decimal strings and are parsed by the
//! processor, so a malformed number is a validation failure of the
//! operation rather than a transport error. JSON / CSV encoders live in
//! the `engine-protocol` crate; this module is purely logical.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::matching::Fill;
use crate::side::Side;

/// A request into the matching engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Place a limit order; matches first, rests any remainder.
    Create(CreateOrder),

    /// Remove a resting order by id.
    Delete(DeleteOrder),
}

impl Operation {
    pub fn order_id(&self) -> &str {
        match self {
            Operation::Create(create) => &create.order_id,
            Operation::Delete(delete) => &delete.order_id,
        }
    }
}

/// CREATE payload, numbers still in their textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    pub order_id: String,
    pub account_id: String,
    pub pair: String,
    pub side: Side,

    /// Decimal string, must parse to a positive value.
    pub amount: String,

    /// Decimal string, must parse to a positive value.
    pub limit_price: String,
}

/// DELETE payload. Only the id is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOrder {
    pub order_id: String,
}

/// An execution between one buy and one sell order.
///
/// `price` is always the resting order's price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub trade_id: String,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub price: Decimal,
    pub quantity: Decimal,

    /// Unix epoch milliseconds.
    pub timestamp: i64,
}

impl Trade {
    /// Stamp a fill with a fresh time-ordered id and the current time.
    pub fn from_fill(fill: Fill) -> Self {
        Trade {
            trade_id: Uuid::now_v7().to_string(),
            buy_order_id: fill.buy_order_id,
            sell_order_id: fill.sell_order_id,
            price: fill.price,
            quantity: fill.quantity,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// How the engine disposed of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    /// CREATE was applied. `remaining` is what is left after matching;
    /// when `resting` is true it now sits in the book.
    Accepted { resting: bool, remaining: Decimal },

    /// DELETE removed a live order.
    Deleted,

    /// DELETE named an order that is not live (filled, deleted or unknown).
    NotFound,

    /// CREATE failed validation; the book is untouched.
    Rejected(ValidationError),
}

/// Result of [`MatchingEngine::process_operation`](crate::MatchingEngine::process_operation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub order_id: String,
    pub status: OperationStatus,

    /// Trades in execution order. Always empty unless the status is `Accepted`.
    pub trades: Vec<Trade>,
}

impl OperationOutcome {
    pub fn new(order_id: impl Into<String>, status: OperationStatus) -> Self {
        OperationOutcome {
            order_id: order_id.into(),
            status,
            trades: Vec::new(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.status, OperationStatus::Rejected(_))
    }

    /// Whether the book may have changed.
    pub fn mutated_book(&self) -> bool {
        match &self.status {
            OperationStatus::Accepted { resting, .. } => *resting || !self.trades.is_empty(),
            OperationStatus::Deleted => true,
            OperationStatus::NotFound | OperationStatus::Rejected(_) => false,
        }
    }
}
