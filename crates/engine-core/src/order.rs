//! Internal order representation used inside the order book.
//!
//! The ledger holds one `Order` per live identifier and is the only
//! place its mutable field (`quantity`) is authoritative. Price levels
//! refer to orders by id and resolve them through the ledger.

use rust_decimal::Decimal;

use crate::numeric::PriceKey;
use crate::side::Side;

/// A single limit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    // Order identification
    pub order_id: String,
    pub account_id: String,
    pub pair: String,

    // Order details
    pub side: Side,
    pub price: Decimal,    // limit price, immutable once created
    pub quantity: Decimal, // remaining unfilled quantity
}

impl Order {
    pub fn new(
        order_id: impl Into<String>,
        account_id: impl Into<String>,
        pair: impl Into<String>,
        side: Side,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Order {
            order_id: order_id.into(),
            account_id: account_id.into(),
            pair: pair.into(),
            side,
            price,
            quantity,
        }
    }

    /// Canonical level key for this order's price.
    pub fn price_key(&self) -> PriceKey {
        PriceKey::new(self.price)
    }

    /// Returns `true` once nothing is left to execute.
    pub fn is_filled(&self) -> bool {
        self.quantity <= Decimal::ZERO
    }

    /// Fill the order by up to `qty`.
    ///
    /// Returns the quantity actually filled (`<= qty` and `<= quantity`).
    pub fn fill(&mut self, qty: Decimal) -> Decimal {
        let filled = qty.min(self.quantity).max(Decimal::ZERO);
        self.quantity -= filled;
        filled
    }

    /// Whether this order may execute against an order resting at
    /// `resting_price`.
    pub fn crosses(&self, resting_price: Decimal) -> bool {
        match self.side {
            Side::Buy => resting_price <= self.price,
            Side::Sell => resting_price >= self.price,
        }
    }
}
