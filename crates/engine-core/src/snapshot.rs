//! Externally representable dump of every live order.
//!
//! Prices and quantities are carried as fixed 8-digit decimal strings,
//! which is also what [`OrderBook::restore`](crate::OrderBook::restore)
//! accepts back (any parsable decimal string is fine on the way in).

use crate::error::RestoreWarning;

/// One live order as rendered for persistence / display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOrder {
    pub order_id: String,
    pub account_id: String,
    pub pair: String,

    /// `"BUY"` or `"SELL"`.
    pub side: String,
    pub price: String,
    pub quantity: String,
}

/// Bids strictly descending by price, asks strictly ascending; equal
/// prices keep arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSnapshot {
    pub bids: Vec<OutputOrder>,
    pub asks: Vec<OutputOrder>,
}

impl BookSnapshot {
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bids.len() + self.asks.len()
    }

    /// Every order, bids first.
    pub fn orders(&self) -> impl Iterator<Item = &OutputOrder> {
        self.bids.iter().chain(self.asks.iter())
    }
}

/// What `restore` loaded and what it skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: Vec<RestoreWarning>,
}
