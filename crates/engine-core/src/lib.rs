//! engine-core
//!
//! Pure matching engine logic for one instrument pair:
//! - order ledger and price-level index
//! - price-time matching with self-trade prevention
//! - book facade (snapshot / restore / top of book)
//! - operation processor (CREATE / DELETE)
//!
//! No I/O, no networking. Hosts serialize every call through one owner.

pub mod side;
pub mod error;
pub mod numeric;
pub mod order;
pub mod ledger;
pub mod price_levels;
pub mod matching;
pub mod messages;
pub mod snapshot;
pub mod top_of_book;
pub mod order_book;
pub mod matching_engine;

pub use side::Side;

pub use error::{InvariantViolation, RestoreWarning, ValidationError};
pub use numeric::{fits_fixed, max_fixed_value, parse_decimal, render_fixed, PriceKey, OUTPUT_SCALE};

pub use messages::{
    CreateOrder,
    DeleteOrder,
    Operation,
    OperationOutcome,
    OperationStatus,
    Trade,
};

pub use order::Order;
pub use ledger::OrderLedger;
pub use price_levels::PriceLevelIndex;
pub use matching::Fill;
pub use snapshot::{BookSnapshot, OutputOrder, RestoreReport};
pub use top_of_book::{LevelSummary, TopOfBook};
pub use order_book::OrderBook;
pub use matching_engine::MatchingEngine;

// Re-exported so downstream crates share one decimal type.
pub use rust_decimal::Decimal;
