//! Single-pair order book with price-time priority.
//!
//! - The [`OrderLedger`] owns order state (id -> order).
//! - The [`PriceLevelIndex`] orders ids by price and arrival.
//! - Bids: best = highest price. Asks: best = lowest price.
//! - FIFO (time priority) within each price level.
//!
//! Every public method keeps the two structures in step: an id is
//! queued on exactly one level iff it is in the ledger, at that order's
//! price, with a positive quantity.

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{InvariantViolation, RestoreWarning, ValidationError};
use crate::ledger::OrderLedger;
use crate::matching;
use crate::messages::Trade;
use crate::numeric::{fits_fixed, parse_decimal, render_fixed, PriceKey};
use crate::order::Order;
use crate::price_levels::{LevelQueue, PriceLevelIndex};
use crate::side::Side;
use crate::snapshot::{BookSnapshot, OutputOrder, RestoreReport};
use crate::top_of_book::{LevelSummary, TopOfBook};

#[derive(Debug, Default, Clone)]
pub struct OrderBook {
    ledger: OrderLedger,
    levels: PriceLevelIndex,
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook::default()
    }

    /// Rest an order in the book.
    ///
    /// Price and quantity must be positive and exact at 8 fractional
    /// digits below `10^20`. An existing order with the
    /// same id is replaced, and its old queue position is given up.
    pub fn add_order(&mut self, order: Order) -> Result<(), ValidationError> {
        if order.price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice(render_fixed(order.price)));
        }
        if order.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(render_fixed(
                order.quantity,
            )));
        }
        if !fits_fixed(order.price) {
            return Err(ValidationError::Unrepresentable {
                field: "price",
                value: order.price.to_string(),
            });
        }
        if !fits_fixed(order.quantity) {
            return Err(ValidationError::Unrepresentable {
                field: "quantity",
                value: order.quantity.to_string(),
            });
        }

        if let Some(previous) = self.ledger.take(&order.order_id) {
            warn!(order_id = %order.order_id, "replacing live order with the same id");
            self.levels.remove_from_level(&previous);
        }

        self.ledger.insert(order.clone())?;
        self.levels.add_to_level(&order);
        debug!(order_id = %order.order_id, side = %order.side, price = %order.price, quantity = %order.quantity, "order rests");
        Ok(())
    }

    /// Remove an order from ledger and price level. `false` if it was not live.
    pub fn remove_order_by_id(&mut self, order_id: &str) -> bool {
        match self.ledger.take(order_id) {
            Some(order) => {
                let dequeued = self.levels.remove_from_level(&order);
                debug_assert!(dequeued, "live order {order_id} was not queued");
                true
            }
            None => false,
        }
    }

    pub fn get_order(&self, order_id: &str) -> Option<&Order> {
        self.ledger.get(order_id)
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.ledger.contains(order_id)
    }

    /// Match `incoming` against the opposite side.
    ///
    /// Resting orders that fill are updated or removed here; `incoming`
    /// is left holding its remainder and is **not** added to the book.
    pub fn match_incoming_order(&mut self, incoming: &mut Order) -> Vec<Trade> {
        matching::match_incoming(&mut self.ledger, &mut self.levels, incoming)
            .into_iter()
            .map(Trade::from_fill)
            .collect()
    }

    /// Number of live orders.
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    /// Drop every order.
    pub fn clear(&mut self) {
        self.ledger.clear();
        self.levels.clear();
    }

    /// Live orders on one side in book order (best price first, then arrival).
    pub fn orders(&self, side: Side) -> impl Iterator<Item = &Order> {
        self.levels
            .levels_best_first(side)
            .flat_map(|(_, queue)| queue.iter())
            .filter_map(|id| self.ledger.get(id))
            .filter(|order| order.quantity > Decimal::ZERO)
    }

    /// Render every live order at the fixed output precision.
    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            bids: self.orders(Side::Buy).map(output_order).collect(),
            asks: self.orders(Side::Sell).map(output_order).collect(),
        }
    }

    /// Replace the whole book with the contents of `snapshot`.
    ///
    /// Bids are loaded before asks, each in listed order, so list order
    /// becomes time priority. Rows that fail to parse or validate are
    /// skipped with a warning; the rest still load.
    pub fn restore(&mut self, snapshot: &BookSnapshot) -> RestoreReport {
        self.clear();

        let mut report = RestoreReport::default();
        for row in snapshot.orders() {
            match parse_output_order(row).and_then(|order| self.add_order(order)) {
                Ok(()) => report.restored += 1,
                Err(reason) => {
                    let warning = RestoreWarning {
                        order_id: row.order_id.clone(),
                        reason,
                    };
                    warn!("{warning}");
                    report.skipped.push(warning);
                }
            }
        }
        report
    }

    /// Best bid and ask with the total quantity resting at each.
    pub fn top_of_book(&self) -> TopOfBook {
        TopOfBook {
            best_bid: self
                .levels
                .levels_best_first(Side::Buy)
                .next()
                .map(|(price, queue)| self.summarize(price, queue)),
            best_ask: self
                .levels
                .levels_best_first(Side::Sell)
                .next()
                .map(|(price, queue)| self.summarize(price, queue)),
        }
    }

    fn summarize(&self, price: PriceKey, queue: &LevelQueue) -> LevelSummary {
        LevelSummary {
            price: price.value(),
            quantity: queue
                .iter()
                .filter_map(|id| self.ledger.get(id))
                .fold(Decimal::ZERO, |total, order| total.saturating_add(order.quantity)),
            orders: queue.len(),
        }
    }

    /// Verify the ledger/index agreement and the no-cross rule.
    ///
    /// A bid and an ask may only overlap in price when they belong to the
    /// same account (self-trade prevention passes over them).
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seen = HashSet::new();

        for side in [Side::Buy, Side::Sell] {
            for (price, queue) in self.levels.levels_ascending(side) {
                if queue.is_empty() {
                    return Err(InvariantViolation::EmptyLevel(price.to_string()));
                }
                for id in queue {
                    let Some(order) = self.ledger.get(id) else {
                        return Err(InvariantViolation::DanglingEntry {
                            order_id: id.clone(),
                            price: price.to_string(),
                        });
                    };
                    if order.price_key() != price || order.side != side {
                        return Err(InvariantViolation::WrongLevel {
                            order_id: id.clone(),
                            queued: price.to_string(),
                            actual: order.price.to_string(),
                        });
                    }
                    if order.quantity <= Decimal::ZERO {
                        return Err(InvariantViolation::NonPositiveQuantity(id.clone()));
                    }
                    if !seen.insert(id.as_str()) {
                        return Err(InvariantViolation::DuplicateEntry(id.clone()));
                    }
                }
            }
        }

        if let Some(order) = self.ledger.iter().find(|o| !seen.contains(o.order_id.as_str())) {
            return Err(InvariantViolation::Unindexed(order.order_id.clone()));
        }

        // Only the overlapping region is visited, so a healthy book costs
        // one comparison here.
        let Some(best_ask) = self.levels.best_ask() else {
            return Ok(());
        };
        for bid in self.orders(Side::Buy) {
            if bid.price < best_ask.value() {
                break;
            }
            for ask in self.orders(Side::Sell) {
                if ask.price > bid.price {
                    break;
                }
                if ask.account_id != bid.account_id {
                    return Err(InvariantViolation::Crossed {
                        bid_order: bid.order_id.clone(),
                        ask_order: ask.order_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn output_order(order: &Order) -> OutputOrder {
    OutputOrder {
        order_id: order.order_id.clone(),
        account_id: order.account_id.clone(),
        pair: order.pair.clone(),
        side: order.side.as_str().to_string(),
        price: render_fixed(order.price),
        quantity: render_fixed(order.quantity),
    }
}

fn parse_output_order(row: &OutputOrder) -> Result<Order, ValidationError> {
    if row.order_id.trim().is_empty() {
        return Err(ValidationError::MissingField("order_id"));
    }
    let side: Side = row.side.parse()?;
    let price =
        parse_decimal(&row.price).ok_or_else(|| ValidationError::InvalidPrice(row.price.clone()))?;
    let quantity = parse_decimal(&row.quantity)
        .ok_or_else(|| ValidationError::InvalidAmount(row.quantity.clone()))?;

    Ok(Order::new(
        row.order_id.clone(),
        row.account_id.clone(),
        row.pair.clone(),
        side,
        price,
        quantity,
    ))
}
