//! EUR amounts. Catalog prices are VAT-inclusive.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

pub const CURRENCY: &str = "eur";

/// Largest stock level a product may carry.
pub const MAX_STOCK: u32 = 1_000_000;

/// Largest catalog unit price, EUR 1,000,000.00. Together with [`MAX_STOCK`]
/// this keeps every line total well inside `Decimal` range.
pub fn max_unit_price() -> Decimal {
    Decimal::new(100_000_000, 2)
}

/// Dutch standard VAT rate, 21%.
pub fn vat_rate() -> Decimal {
    Decimal::new(21, 2)
}

pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The VAT share contained in a VAT-inclusive amount.
pub fn vat_included(gross: Decimal) -> Decimal {
    let net = gross / (Decimal::ONE + vat_rate());
    round_cents(gross - net)
}

/// Amount in cents, as payment processors expect it. `None` on overflow.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vat_share_of_inclusive_price() {
        assert_eq!(vat_included(Decimal::new(12100, 2)), Decimal::new(2100, 2));
        assert_eq!(vat_included(Decimal::new(17998, 2)), Decimal::new(3124, 2));
        assert_eq!(vat_included(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn minor_units_round_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::new(8999, 2)), Some(8999));
        assert_eq!(to_minor_units(Decimal::new(10005, 3)), Some(1001));
        assert_eq!(to_minor_units(Decimal::new(1, 0)), Some(100));
    }

    #[test]
    fn minor_units_overflow_is_none() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
        // Fits in Decimal after scaling but not in i64.
        assert_eq!(to_minor_units(Decimal::new(i64::MAX, 0)), None);
        assert_eq!(
            to_minor_units(Decimal::new(92_233_720_368_547_758, 2)),
            Some(92_233_720_368_547_758)
        );
    }
}
