//! Operation processor.
//!
//! Takes one CREATE/DELETE at a time and drives the [`OrderBook`]:
//! - CREATE: validate and parse, match against the book, then rest
//!   whatever quantity is left at the original limit price.
//! - DELETE: remove by id; an unknown id is reported, not raised.
//!
//! The processor holds no state of its own beyond the book and an
//! optional pair binding. Callers that share it across tasks must funnel
//! every call through a single owner.

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::error::ValidationError;
use crate::messages::{CreateOrder, Operation, OperationOutcome, OperationStatus};
use crate::numeric::{fits_fixed, parse_decimal};
use crate::order::Order;
use crate::order_book::OrderBook;
use crate::snapshot::{BookSnapshot, RestoreReport};
use crate::top_of_book::TopOfBook;

#[derive(Debug, Default)]
pub struct MatchingEngine {
    book: OrderBook,

    /// When set, CREATEs for any other pair are rejected.
    pair: Option<String>,
}

impl MatchingEngine {
    /// Create an engine that accepts orders for any pair.
    pub fn new() -> Self {
        MatchingEngine::default()
    }

    /// Create an engine bound to a single instrument pair.
    pub fn for_pair(pair: impl Into<String>) -> Self {
        MatchingEngine {
            book: OrderBook::new(),
            pair: Some(pair.into()),
        }
    }

    pub fn pair(&self) -> Option<&str> {
        self.pair.as_deref()
    }

    /// Apply one operation and report what happened.
    pub fn process_operation(&mut self, op: Operation) -> OperationOutcome {
        let outcome = match op {
            Operation::Create(create) => self.process_create(create),
            Operation::Delete(delete) => self.process_delete(&delete.order_id),
        };

        if cfg!(debug_assertions) {
            if let Err(violation) = self.book.check_invariants() {
                error!(order_id = %outcome.order_id, %violation, "book invariant broken");
                debug_assert!(false, "book invariant broken: {violation}");
            }
        }

        outcome
    }

    fn process_create(&mut self, create: CreateOrder) -> OperationOutcome {
        let order_id = create.order_id.clone();

        let mut order = match self.validate_create(create) {
            Ok(order) => order,
            Err(reason) => {
                warn!(%order_id, %reason, "CREATE rejected");
                return OperationOutcome::new(order_id, OperationStatus::Rejected(reason));
            }
        };

        let trades = self.book.match_incoming_order(&mut order);
        let remaining = order.quantity;

        let resting = remaining > Decimal::ZERO;
        if resting {
            if let Err(reason) = self.book.add_order(order) {
                // Price and quantity were checked above, so this is unreachable
                // unless the book itself is broken.
                error!(%order_id, %reason, "failed to rest remainder");
                debug_assert!(false, "failed to rest {order_id}: {reason}");
            }
        }

        info!(
            %order_id,
            trades = trades.len(),
            %remaining,
            resting,
            "CREATE processed"
        );

        OperationOutcome {
            order_id,
            status: OperationStatus::Accepted { resting, remaining },
            trades,
        }
    }

    fn process_delete(&mut self, order_id: &str) -> OperationOutcome {
        if self.book.remove_order_by_id(order_id) {
            info!(%order_id, "DELETE processed");
            OperationOutcome::new(order_id, OperationStatus::Deleted)
        } else {
            warn!(%order_id, "DELETE for an order that is not in the book");
            OperationOutcome::new(order_id, OperationStatus::NotFound)
        }
    }

    /// Turn a CREATE payload into an order ready to match.
    fn validate_create(&self, create: CreateOrder) -> Result<Order, ValidationError> {
        for (field, value) in [
            ("order_id", &create.order_id),
            ("account_id", &create.account_id),
            ("pair", &create.pair),
            ("amount", &create.amount),
            ("limit_price", &create.limit_price),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }

        let amount = parse_decimal(&create.amount)
            .ok_or_else(|| ValidationError::InvalidAmount(create.amount.clone()))?;
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity(create.amount));
        }
        if !fits_fixed(amount) {
            return Err(ValidationError::Unrepresentable {
                field: "amount",
                value: create.amount,
            });
        }

        let price = parse_decimal(&create.limit_price)
            .ok_or_else(|| ValidationError::InvalidPrice(create.limit_price.clone()))?;
        if price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice(create.limit_price));
        }
        if !fits_fixed(price) {
            return Err(ValidationError::Unrepresentable {
                field: "limit_price",
                value: create.limit_price,
            });
        }

        if let Some(expected) = &self.pair {
            if *expected != create.pair {
                return Err(ValidationError::PairMismatch {
                    expected: expected.clone(),
                    got: create.pair,
                });
            }
        }

        if self.book.contains(&create.order_id) {
            return Err(ValidationError::DuplicateOrderId(create.order_id));
        }

        debug!(order_id = %create.order_id, side = %create.side, %price, %amount, "CREATE validated");
        Ok(Order::new(
            create.order_id,
            create.account_id,
            create.pair,
            create.side,
            price,
            amount,
        ))
    }

    /// Read-only access to the underlying book.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn snapshot(&self) -> BookSnapshot {
        self.book.snapshot()
    }

    /// Replace the book with a snapshot (e.g. loaded at startup).
    pub fn restore(&mut self, snapshot: &BookSnapshot) -> RestoreReport {
        let report = self.book.restore(snapshot);
        info!(
            restored = report.restored,
            skipped = report.skipped.len(),
            "order book restored"
        );
        report
    }

    pub fn top_of_book(&self) -> TopOfBook {
        self.book.top_of_book()
    }
}
