use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, ParseBigDecimalError, RoundingMode, Zero};
use serde::{Deserialize, Serialize};

/// All monetary columns and API fields carry two fractional digits.
pub const MONEY_SCALE: i64 = 2;

/// ISO 4217 currency codes the store can operate in.
///
/// Amounts inside a single cart are always in one currency, so the code
/// travels on the boundaries that need it (capture requests, persisted
/// orders) rather than on every amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "INR")]
    Inr,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Some(Currency::Usd),
            "INR" => Some(Currency::Inr),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The currency every catalog price is denominated in.
pub const STORE_CURRENCY: Currency = Currency::Usd;

/// A monetary amount in fixed-point decimal representation.
///
/// Binary floating point never enters a monetary computation; every
/// arithmetic step stays in `BigDecimal` and amounts are rounded half-up to
/// [`MONEY_SCALE`] digits only when finalized for display or persistence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(BigDecimal);

impl Money {
    pub fn new(amount: BigDecimal) -> Self {
        Money(amount)
    }

    pub fn zero() -> Self {
        Money(BigDecimal::zero())
    }

    /// Build an amount from minor units (cents), e.g. `from_minor_units(999)`
    /// is 9.99. Infallible, which keeps fixed rate tables free of parsing.
    pub fn from_minor_units(minor: i64) -> Self {
        Money(BigDecimal::new(BigInt::from(minor), MONEY_SCALE))
    }

    pub fn amount(&self) -> &BigDecimal {
        &self.0
    }

    pub fn into_inner(self) -> BigDecimal {
        self.0
    }

    /// Half-up rounding to [`MONEY_SCALE`] digits, applied at the point an
    /// amount is finalized for display or persistence.
    pub fn rounded(&self) -> Money {
        Money(self.0.with_scale_round(MONEY_SCALE, RoundingMode::HalfUp))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::zero()
    }

    /// Multiply by a unitless decimal rate (tax rate, discount percentage).
    pub fn times_rate(&self, rate: &BigDecimal) -> Money {
        Money(&self.0 * rate)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Add<&Money> for Money {
    type Output = Money;

    fn add(self, rhs: &Money) -> Money {
        Money(self.0 + &rhs.0)
    }
}

impl AddAssign<&Money> for Money {
    fn add_assign(&mut self, rhs: &Money) {
        self.0 += &rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sub<&Money> for Money {
    type Output = Money;

    fn sub(self, rhs: &Money) -> Money {
        Money(self.0 - &rhs.0)
    }
}

impl Mul<i32> for &Money {
    type Output = Money;

    fn mul(self, qty: i32) -> Money {
        Money(&self.0 * BigDecimal::from(qty))
    }
}

impl FromStr for Money {
    type Err = ParseBigDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigDecimal::from_str(s.trim()).map(Money)
    }
}

impl fmt::Display for Money {
    /// Renders the rounded two-digit form, which is what DTOs serialize.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().expect("valid decimal")
    }

    #[test]
    fn from_minor_units_scales_to_two_digits() {
        assert_eq!(Money::from_minor_units(999).to_string(), "9.99");
        assert_eq!(Money::from_minor_units(5000).to_string(), "50.00");
        assert_eq!(Money::from_minor_units(0).to_string(), "0.00");
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(money("1.995").rounded(), money("2.00"));
        assert_eq!(money("1.994").rounded(), money("1.99"));
        assert_eq!(money("1.005").rounded(), money("1.01"));
    }

    #[test]
    fn arithmetic_stays_exact_in_decimal() {
        // 0.1 + 0.2 is exactly 0.3 in decimal, unlike binary floats.
        let sum = money("0.1") + money("0.2");
        assert_eq!(sum, money("0.3"));
    }

    #[test]
    fn quantity_multiplication() {
        assert_eq!(&money("19.99") * 3, money("59.97"));
    }

    #[test]
    fn rate_multiplication_then_rounding() {
        // 19.99 * 0.10 = 1.999, finalized as 2.00
        let rate: BigDecimal = "0.10".parse().expect("valid rate");
        assert_eq!(money("19.99").times_rate(&rate).rounded(), money("2.00"));
    }

    #[test]
    fn display_always_shows_two_digits() {
        assert_eq!(money("10").to_string(), "10.00");
        assert_eq!(money("10.5").to_string(), "10.50");
    }

    #[test]
    fn negative_detection() {
        assert!(money("-0.01").is_negative());
        assert!(!Money::zero().is_negative());
    }

    #[test]
    fn currency_codes_parse_case_insensitively() {
        assert_eq!(Currency::parse("usd"), Some(Currency::Usd));
        assert_eq!(Currency::parse("INR"), Some(Currency::Inr));
        assert_eq!(Currency::parse("EUR"), None);
    }
}
