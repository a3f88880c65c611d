//! Currency rounding helpers.
//!
//! All monetary values in Tavola are `rust_decimal::Decimal` (NUMERIC at the
//! storage boundary). Derived values are rounded to cents at the point they
//! are produced, not only once at the end: `tax` is rounded before it is
//! added into `total`. This matches how receipts are actually printed.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to 2 decimal places, half away from zero.
#[must_use]
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round2(dec!(2.797)), dec!(2.80));
        assert_eq!(round2(dec!(2.794)), dec!(2.79));
        assert_eq!(round2(dec!(0.005)), dec!(0.01));
    }

    #[test]
    fn leaves_cent_values_alone() {
        assert_eq!(round2(dec!(33.76)), dec!(33.76));
        assert_eq!(round2(dec!(0)), dec!(0));
    }
}
