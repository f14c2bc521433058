//! Price-time matching of one incoming order against the resting book.
//!
//! Walk order (BUY shown, SELL mirrors it against bids, dearest first):
//! 1. Ask levels cheapest first; the walk ends at the first level priced
//!    above the incoming limit, or as soon as the incoming order is done.
//! 2. Inside a level, resting orders in arrival order.
//! 3. A resting order of the incoming account is passed over, not
//!    cancelled and not moved.
//! 4. Otherwise execute `min(incoming, resting)` at the resting price and
//!    write the new resting quantity back to the ledger; a resting order
//!    that reaches zero leaves both ledger and index before the walk moves on.
//!
//! The incoming order is never inserted here. Resting any remainder is
//! left to the caller.

use rust_decimal::Decimal;
use tracing::{debug, error};

use crate::ledger::OrderLedger;
use crate::numeric::PriceKey;
use crate::order::Order;
use crate::price_levels::PriceLevelIndex;
use crate::side::Side;

/// One execution, before it is stamped with a trade id and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Match `incoming` against the opposite side of the book.
///
/// `incoming.quantity` is reduced in place to what is left afterwards.
pub fn match_incoming(
    ledger: &mut OrderLedger,
    levels: &mut PriceLevelIndex,
    incoming: &mut Order,
) -> Vec<Fill> {
    let mut fills = Vec::new();
    let resting_side = incoming.side.opposite();

    // Crossing prices are gathered before the walk because fills drop
    // levels out of the index underneath us.
    let crossing: Vec<PriceKey> = levels
        .levels_best_first(resting_side)
        .take_while(|(price, _)| incoming.crosses(price.value()))
        .map(|(price, _)| price)
        .collect();

    for price in crossing {
        if incoming.is_filled() {
            break;
        }

        // Ids are copied out so the queue can shrink while we walk it.
        let queued: Vec<String> = match levels.level(resting_side, price) {
            Some(queue) => queue.iter().cloned().collect(),
            None => continue,
        };

        for resting_id in queued {
            if incoming.is_filled() {
                break;
            }

            let Some(resting) = ledger.get_mut(&resting_id) else {
                error!(order_id = %resting_id, %price, "price level references an order missing from the ledger");
                debug_assert!(false, "dangling level entry {resting_id}");
                continue;
            };

            if resting.account_id == incoming.account_id {
                debug!(
                    incoming = %incoming.order_id,
                    resting = %resting.order_id,
                    account = %incoming.account_id,
                    "self-trade prevented, skipping resting order"
                );
                continue;
            }

            let qty = incoming.quantity.min(resting.quantity);
            if qty <= Decimal::ZERO {
                continue;
            }

            let exec_price = resting.price;
            resting.fill(qty);
            incoming.fill(qty);
            let resting_done = resting.is_filled();

            let (buy_order_id, sell_order_id) = match incoming.side {
                Side::Buy => (incoming.order_id.clone(), resting_id.clone()),
                Side::Sell => (resting_id.clone(), incoming.order_id.clone()),
            };
            debug!(buy = %buy_order_id, sell = %sell_order_id, price = %exec_price, quantity = %qty, "fill");
            fills.push(Fill {
                buy_order_id,
                sell_order_id,
                price: exec_price,
                quantity: qty,
            });

            if resting_done {
                if let Some(done) = ledger.take(&resting_id) {
                    let dequeued = levels.remove_from_level(&done);
                    debug_assert!(dequeued, "filled order {resting_id} was not queued");
                }
            }
        }
    }

    fills
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::parse_decimal;

    fn d(s: &str) -> Decimal {
        parse_decimal(s).unwrap()
    }

    fn rest(ledger: &mut OrderLedger, levels: &mut PriceLevelIndex, order: Order) {
        levels.add_to_level(&order);
        ledger.insert(order).unwrap();
    }

    fn order(id: &str, acc: &str, side: Side, price: &str, qty: &str) -> Order {
        Order::new(id, acc, "BTC/USD", side, d(price), d(qty))
    }

    #[test]
    fn executes_at_resting_price() {
        let mut ledger = OrderLedger::new();
        let mut levels = PriceLevelIndex::new();
        rest(&mut ledger, &mut levels, order("sell1", "s", Side::Sell, "98", "5"));

        let mut incoming = order("buy1", "b", Side::Buy, "100", "5");
        let fills = match_incoming(&mut ledger, &mut levels, &mut incoming);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, d("98"));
        assert_eq!(fills[0].quantity, d("5"));
        assert!(incoming.is_filled());
        assert!(ledger.is_empty());
        assert!(levels.best_ask().is_none());
    }

    #[test]
    fn stops_at_non_crossing_level() {
        let mut ledger = OrderLedger::new();
        let mut levels = PriceLevelIndex::new();
        rest(&mut ledger, &mut levels, order("s1", "s", Side::Sell, "100", "1"));
        rest(&mut ledger, &mut levels, order("s2", "s", Side::Sell, "101", "1"));

        let mut incoming = order("b1", "b", Side::Buy, "100", "5");
        let fills = match_incoming(&mut ledger, &mut levels, &mut incoming);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].sell_order_id, "s1");
        assert_eq!(incoming.quantity, d("4"));
        assert_eq!(ledger.get("s2").unwrap().quantity, d("1"));
    }

    #[test]
    fn sell_walks_bids_highest_first() {
        let mut ledger = OrderLedger::new();
        let mut levels = PriceLevelIndex::new();
        rest(&mut ledger, &mut levels, order("b95", "x", Side::Buy, "95", "10"));
        rest(&mut ledger, &mut levels, order("b97", "y", Side::Buy, "97", "5"));

        let mut incoming = order("s1", "z", Side::Sell, "95", "8");
        let fills = match_incoming(&mut ledger, &mut levels, &mut incoming);

        assert_eq!(fills.len(), 2);
        assert_eq!((fills[0].buy_order_id.as_str(), fills[0].price), ("b97", d("97")));
        assert_eq!((fills[1].buy_order_id.as_str(), fills[1].price), ("b95", d("95")));
        assert_eq!(fills[1].quantity, d("3"));
        assert_eq!(ledger.get("b95").unwrap().quantity, d("7"));
    }

    #[test]
    fn skips_own_orders_but_keeps_them_queued() {
        let mut ledger = OrderLedger::new();
        let mut levels = PriceLevelIndex::new();
        rest(&mut ledger, &mut levels, order("mine", "x", Side::Sell, "100", "3"));
        rest(&mut ledger, &mut levels, order("theirs", "y", Side::Sell, "100", "3"));

        let mut incoming = order("b1", "x", Side::Buy, "100", "5");
        let fills = match_incoming(&mut ledger, &mut levels, &mut incoming);

        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].sell_order_id, "theirs");
        assert_eq!(incoming.quantity, d("2"));

        let key = PriceKey::new(d("100"));
        let queue: Vec<_> = levels.level(Side::Sell, key).unwrap().iter().cloned().collect();
        assert_eq!(queue, vec!["mine"]);
        assert_eq!(ledger.get("mine").unwrap().quantity, d("3"));
    }

    #[test]
    fn fractional_quantities_are_exact() {
        let mut ledger = OrderLedger::new();
        let mut levels = PriceLevelIndex::new();
        rest(&mut ledger, &mut levels, order("s1", "s", Side::Sell, "0.3", "0.1"));
        rest(&mut ledger, &mut levels, order("s2", "s", Side::Sell, "0.3", "0.2"));

        let mut incoming = order("b1", "b", Side::Buy, "0.30", "0.3");
        let fills = match_incoming(&mut ledger, &mut levels, &mut incoming);

        let total: Decimal = fills.iter().map(|f| f.quantity).sum();
        assert_eq!(total, d("0.3"));
        assert!(incoming.is_filled());
        assert!(ledger.is_empty());
    }
}
