//! Price-level index: price -> FIFO queue of order ids, per side.
//!
//! - Bids and asks each live in a `BTreeMap` keyed by [`PriceKey`], so
//!   keys are sorted ascending; the highest bid key and the lowest ask
//!   key are best.
//! - A queue holds ids in arrival order. That order is the time
//!   priority and is never rearranged by partial fills.
//! - An empty queue is never left behind: the level is dropped with its
//!   last id.
//!
//! The index stores identifiers only. Quantities and accounts are
//! always read back through the ledger.

use std::collections::{BTreeMap, VecDeque};

use crate::numeric::PriceKey;
use crate::order::Order;
use crate::side::Side;

/// FIFO queue of order ids at one price.
pub type LevelQueue = VecDeque<String>;

#[derive(Debug, Default, Clone)]
pub struct PriceLevelIndex {
    bids: BTreeMap<PriceKey, LevelQueue>,
    asks: BTreeMap<PriceKey, LevelQueue>,
}

impl PriceLevelIndex {
    pub fn new() -> Self {
        PriceLevelIndex::default()
    }

    fn side_map(&self, side: Side) -> &BTreeMap<PriceKey, LevelQueue> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_map_mut(&mut self, side: Side) -> &mut BTreeMap<PriceKey, LevelQueue> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Append the order id to the tail of its price level.
    pub fn add_to_level(&mut self, order: &Order) {
        self.side_map_mut(order.side)
            .entry(order.price_key())
            .or_default()
            .push_back(order.order_id.clone());
    }

    /// Remove the order id from its price level, dropping the level if it
    /// becomes empty. Returns `false` if the id was not queued there.
    pub fn remove_from_level(&mut self, order: &Order) -> bool {
        let key = order.price_key();
        let levels = self.side_map_mut(order.side);

        let Some(queue) = levels.get_mut(&key) else {
            return false;
        };
        let Some(pos) = queue.iter().position(|id| *id == order.order_id) else {
            return false;
        };

        // `VecDeque::remove` shifts the tail, so arrival order survives.
        queue.remove(pos);
        if queue.is_empty() {
            levels.remove(&key);
        }
        true
    }

    /// Levels of one side from lowest to highest price.
    ///
    /// Lazy and restartable: every call starts a fresh walk.
    pub fn levels_ascending(&self, side: Side) -> impl Iterator<Item = (PriceKey, &LevelQueue)> {
        self.side_map(side).iter().map(|(price, queue)| (*price, queue))
    }

    /// Levels of one side from highest to lowest price.
    pub fn levels_descending(&self, side: Side) -> impl Iterator<Item = (PriceKey, &LevelQueue)> {
        self.side_map(side)
            .iter()
            .rev()
            .map(|(price, queue)| (*price, queue))
    }

    /// Levels of `side` in matching order: asks cheapest first, bids
    /// dearest first.
    pub fn levels_best_first(
        &self,
        side: Side,
    ) -> Box<dyn Iterator<Item = (PriceKey, &LevelQueue)> + '_> {
        match side {
            Side::Buy => Box::new(self.levels_descending(side)),
            Side::Sell => Box::new(self.levels_ascending(side)),
        }
    }

    pub fn level(&self, side: Side, price: PriceKey) -> Option<&LevelQueue> {
        self.side_map(side).get(&price)
    }

    /// Highest bid price, if any.
    pub fn best_bid(&self) -> Option<PriceKey> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price, if any.
    pub fn best_ask(&self) -> Option<PriceKey> {
        self.asks.keys().next().copied()
    }

    pub fn level_count(&self, side: Side) -> usize {
        self.side_map(side).len()
    }

    /// Total number of queued ids across both sides.
    pub fn order_count(&self) -> usize {
        self.bids.values().chain(self.asks.values()).map(VecDeque::len).sum()
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}
