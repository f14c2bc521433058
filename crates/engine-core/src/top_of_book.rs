//! Best bid / best ask summary.

use rust_decimal::Decimal;

/// Aggregate of the best price level on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSummary {
    pub price: Decimal,
    /// Sum of remaining quantity at this price.
    pub quantity: Decimal,
    pub orders: usize,
}

/// Snapshot of the top of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopOfBook {
    pub best_bid: Option<LevelSummary>,
    pub best_ask: Option<LevelSummary>,
}

impl TopOfBook {
    /// Returns `true` if there is *no* bid and *no* ask.
    pub fn is_empty(&self) -> bool {
        self.best_bid.is_none() && self.best_ask.is_none()
    }

    /// `best_ask - best_bid` when both sides are present.
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid, self.best_ask) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_needs_both_sides() {
        let bid = LevelSummary {
            price: Decimal::from(99),
            quantity: Decimal::from(5),
            orders: 1,
        };
        let ask = LevelSummary {
            price: Decimal::from(101),
            ..bid
        };

        let tob = TopOfBook {
            best_bid: Some(bid),
            best_ask: None,
        };
        assert_eq!(tob.spread(), None);
        assert!(!tob.is_empty());

        let tob = TopOfBook {
            best_bid: Some(bid),
            best_ask: Some(ask),
        };
        assert_eq!(tob.spread(), Some(Decimal::from(2)));
        assert!(TopOfBook::default().is_empty());
    }
}
