//! Order ledger: id -> current order state.
//!
//! The ledger is the single source of truth for an order's remaining
//! quantity. It knows nothing about price levels; keeping the two in
//! step is the [`OrderBook`](crate::order_book::OrderBook)'s job.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::numeric::render_fixed;
use crate::order::Order;

#[derive(Debug, Default, Clone)]
pub struct OrderLedger {
    orders: HashMap<String, Order>,
}

impl OrderLedger {
    pub fn new() -> Self {
        OrderLedger::default()
    }

    /// Store (or overwrite) an order by id.
    ///
    /// Orders with a non-positive quantity are refused and the ledger is
    /// left untouched.
    pub fn insert(&mut self, order: Order) -> Result<(), ValidationError> {
        if order.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(render_fixed(
                order.quantity,
            )));
        }
        self.orders.insert(order.order_id.clone(), order);
        Ok(())
    }

    /// Remove an order. `false` means it was already consumed or never
    /// existed; callers treat that as benign.
    pub fn remove(&mut self, order_id: &str) -> bool {
        self.orders.remove(order_id).is_some()
    }

    /// Remove and return the order.
    pub fn take(&mut self, order_id: &str) -> Option<Order> {
        self.orders.remove(order_id)
    }

    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.orders.get(order_id)
    }

    pub fn get_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.orders.get_mut(order_id)
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.orders.contains_key(order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn clear(&mut self) {
        self.orders.clear();
    }

    /// Unordered iteration over every live order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }
}
