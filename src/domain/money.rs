//! Monetary types and spread arithmetic.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision.
pub type Price = Decimal;

/// Dollar amount (balance, size, profit).
pub type Usd = Decimal;

/// Percentage expressed in percent units (0.5 means 0.5%).
pub type Pct = Decimal;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Spread of the perp over the spot in percent: `(perp - spot) / spot * 100`.
///
/// Returns `None` for a non-positive spot price.
#[must_use]
pub fn spread_pct(spot: Price, perp: Price) -> Option<Pct> {
    if spot <= Decimal::ZERO {
        return None;
    }
    Some((perp - spot) / spot * HUNDRED)
}

/// Convert a percentage into a fraction (`0.15` → `0.0015`).
#[must_use]
pub fn pct_to_rate(pct: Pct) -> Decimal {
    pct / HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn spread_of_premium_perp() {
        assert_eq!(spread_pct(dec!(100.00), dec!(100.50)), Some(dec!(0.5)));
    }

    #[test]
    fn spread_is_negative_for_discount() {
        assert_eq!(spread_pct(dec!(200), dec!(199)), Some(dec!(-0.5)));
    }

    #[test]
    fn spread_rejects_zero_spot() {
        assert_eq!(spread_pct(Decimal::ZERO, dec!(1)), None);
    }

    #[test]
    fn pct_converts_to_rate() {
        assert_eq!(pct_to_rate(dec!(0.15)), dec!(0.0015));
    }
}
