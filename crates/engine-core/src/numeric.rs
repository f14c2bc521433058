//! Exact decimal helpers for prices and quantities.
//!
//! All arithmetic and comparisons inside the engine use
//! [`rust_decimal::Decimal`]. The fixed 8-digit rendering is applied
//! only when a value leaves the engine (snapshots, wire output).

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits used for every external rendering.
pub const OUTPUT_SCALE: u32 = 8;

/// Canonical key for a price level.
///
/// Built from the normalized decimal (trailing zeros stripped), so
/// `"100"`, `"100.0"` and `"100.00000000"` all land on the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriceKey(Decimal);

impl PriceKey {
    pub fn new(price: Decimal) -> Self {
        PriceKey(price.normalize())
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for PriceKey {
    fn from(price: Decimal) -> Self {
        PriceKey::new(price)
    }
}

impl fmt::Display for PriceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a decimal string. Accepts plain (`"12.5"`) and scientific
/// (`"1.25e1"`) notation; surrounding whitespace is ignored.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Exclusive upper bound on any price or quantity: `10^20`.
///
/// With [`OUTPUT_SCALE`] fractional digits this keeps every value, and
/// the sum of a price level, inside the 96-bit mantissa.
pub fn max_fixed_value() -> Decimal {
    Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0)
}

/// `true` when `value` renders at [`OUTPUT_SCALE`] digits without
/// rounding and lies below [`max_fixed_value`].
///
/// Trailing zeros do not count: `"1.0000000000"` fits.
pub fn fits_fixed(value: Decimal) -> bool {
    value.normalize().scale() <= OUTPUT_SCALE && value.abs() < max_fixed_value()
}

/// Render with exactly [`OUTPUT_SCALE`] fractional digits, rounding
/// half away from zero.
pub fn render_fixed(value: Decimal) -> String {
    let mut rounded =
        value.round_dp_with_strategy(OUTPUT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(OUTPUT_SCALE);
    rounded.to_string()
}
