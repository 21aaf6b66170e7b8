//! Validated numeric primitives
//!
//! Quantities, prices and tax percentages are checked once when a request is
//! priced, so the invoice arithmetic never sees a negative or out-of-range
//! value. Inputs keep their full precision; only computed totals are rounded.

use rust_decimal::{Decimal, RoundingStrategy};

/// Money is rounded to paise
const MONEY_SCALE: u32 = 2;

/// Largest money value accepted; totals are stored as NUMERIC(14, 2)
fn max_money() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Largest quantity accepted on a line or as stock
fn max_quantity() -> Decimal {
    Decimal::new(99_999_999_999_999, 3)
}

/// Errors raised while validating a numeric input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: Decimal },

    #[error("{field} must be between 0 and 100 (got {value})")]
    PercentOutOfRange { field: &'static str, value: Decimal },

    #[error("{field} exceeds the maximum allowed value")]
    Overflow { field: &'static str },
}

/// Round a money value to paise, halves away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Quantity of an item on an invoice line.
///
/// # Invariants
/// - Never negative (zero is allowed)
/// - Fractions of any precision are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(Decimal);

impl Quantity {
    pub fn new(value: Decimal) -> Result<Self, ValueError> {
        const FIELD: &str = "quantity";

        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValueError::Negative {
                field: FIELD,
                value,
            });
        }
        if value > max_quantity() {
            return Err(ValueError::Overflow { field: FIELD });
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// A non-negative money value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(Decimal);

impl Money {
    /// Validate `value` for the named field.
    pub fn new(field: &'static str, value: Decimal) -> Result<Self, ValueError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValueError::Negative { field, value });
        }
        if value > max_money() {
            return Err(ValueError::Overflow { field });
        }

        Ok(Self(value))
    }

    /// Like [`Money::new`] but zero is rejected too.
    pub fn positive(field: &'static str, value: Decimal) -> Result<Self, ValueError> {
        if value <= Decimal::ZERO {
            return Err(ValueError::NotPositive { field, value });
        }
        Self::new(field, value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// GST component rate in percent (CGST or SGST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(Decimal);

impl Percent {
    pub fn new(field: &'static str, value: Decimal) -> Result<Self, ValueError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ValueError::Negative { field, value });
        }
        if value > Decimal::ONE_HUNDRED {
            return Err(ValueError::PercentOutOfRange { field, value });
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
        assert_eq!(round_money(dec!(10.004)), dec!(10.00));
        assert_eq!(round_money(dec!(1.125)), dec!(1.13));
        assert_eq!(round_money(dec!(-1.125)), dec!(-1.13));
    }

    #[test]
    fn test_quantity_accepts_zero_and_fractions() {
        assert_eq!(Quantity::new(Decimal::ZERO).unwrap().value(), Decimal::ZERO);
        assert_eq!(Quantity::new(dec!(1.250)).unwrap().value(), dec!(1.250));
    }

    #[test]
    fn test_quantity_rejects_negative() {
        let err = Quantity::new(dec!(-1)).unwrap_err();
        assert!(matches!(err, ValueError::Negative { field: "quantity", .. }));
    }

    #[test]
    fn test_inputs_keep_full_precision() {
        assert_eq!(Quantity::new(dec!(0.0001)).unwrap().value(), dec!(0.0001));
        assert_eq!(Money::new("rate", dec!(33.333)).unwrap().value(), dec!(33.333));
        assert_eq!(Percent::new("cgst", dec!(2.125)).unwrap().value(), dec!(2.125));
    }

    #[test]
    fn test_money_positive_rejects_zero() {
        let err = Money::positive("unit_price", Decimal::ZERO).unwrap_err();
        assert!(matches!(err, ValueError::NotPositive { field: "unit_price", .. }));
    }

    #[test]
    fn test_money_overflow() {
        let err = Money::new("rate", dec!(1000000000000)).unwrap_err();
        assert_eq!(err, ValueError::Overflow { field: "rate" });
        assert!(Money::new("rate", dec!(999999999999.99)).is_ok());
    }

    #[test]
    fn test_percent_bounds() {
        assert!(Percent::new("cgst", dec!(0)).is_ok());
        assert!(Percent::new("cgst", dec!(100)).is_ok());
        assert!(matches!(
            Percent::new("sgst", dec!(100.01)),
            Err(ValueError::PercentOutOfRange { .. })
        ));
        assert!(matches!(
            Percent::new("sgst", dec!(-2.5)),
            Err(ValueError::Negative { .. })
        ));
    }
}
