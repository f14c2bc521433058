//! Error types for the core matching engine.
//!
//! Every condition here is local and recoverable: the book facade and
//! the operation processor absorb them, log them and hand them back to
//! the caller as data. Nothing in this module is ever raised as a panic.
//! Internal consistency problems (ledger and price levels disagreeing)
//! are not modelled as errors at all; they are debug assertions.

use thiserror::Error;

/// Reasons a CREATE (or a direct `add_order`) is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("invalid limit price: {0:?}")]
    InvalidPrice(String),

    #[error("invalid side: {0:?}")]
    InvalidSide(String),

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(String),

    #[error("price must be positive, got {0}")]
    NonPositivePrice(String),

    #[error("{field} {value} needs more than 8 fractional digits or is not below 1e20")]
    Unrepresentable { field: &'static str, value: String },

    #[error("order {0} is already live in the book")]
    DuplicateOrderId(String),

    #[error("pair {got} does not match engine pair {expected}")]
    PairMismatch { expected: String, got: String },
}

/// A snapshot row that `restore` skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("skipped snapshot entry {order_id}: {reason}")]
pub struct RestoreWarning {
    pub order_id: String,
    pub reason: ValidationError,
}

/// Structural breakage between the ledger and the price levels.
///
/// Only produced by [`OrderBook::check_invariants`](crate::OrderBook::check_invariants);
/// correct matching never yields one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("level {price} queues {order_id}, which is not in the ledger")]
    DanglingEntry { order_id: String, price: String },

    #[error("order {order_id} is queued at {queued} but priced {actual}")]
    WrongLevel {
        order_id: String,
        queued: String,
        actual: String,
    },

    #[error("order {0} is queued more than once")]
    DuplicateEntry(String),

    #[error("order {0} is in the ledger but on no price level")]
    Unindexed(String),

    #[error("order {0} is live with a non-positive quantity")]
    NonPositiveQuantity(String),

    #[error("empty price level left at {0}")]
    EmptyLevel(String),

    #[error("bid {bid_order} crosses ask {ask_order} across different accounts")]
    Crossed { bid_order: String, ask_order: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::InvalidAmount("abc".to_string());
        assert_eq!(err.to_string(), "invalid amount: \"abc\"");

        let err = ValidationError::PairMismatch {
            expected: "BTC/USD".to_string(),
            got: "ETH/USD".to_string(),
        };
        assert!(err.to_string().contains("ETH/USD"));
    }

    #[test]
    fn restore_warning_mentions_order() {
        let warning = RestoreWarning {
            order_id: "bid7".to_string(),
            reason: ValidationError::MissingField("price"),
        };
        assert_eq!(
            warning.to_string(),
            "skipped snapshot entry bid7: missing required field: price"
        );
    }
}
