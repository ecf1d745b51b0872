use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Currency amount held as integer cents. Serializes as a decimal number
/// (the shape the surrounding API layer expects), so `Money::from_major(50.0)`
/// round-trips as `50.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Coerces a raw decimal amount, rounding to the nearest cent.
    /// Non-finite input becomes zero.
    pub fn from_major(amount: f64) -> Self {
        if !amount.is_finite() {
            return Self::ZERO;
        }
        Self((amount * 100.0).round() as i64)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Treats `self` as an hourly rate and charges it for `minutes`,
    /// rounding half up to the nearest cent.
    pub fn for_minutes(&self, minutes: u16) -> Money {
        Money((self.0 * minutes as i64 + 30) / 60)
    }

    pub fn times(&self, n: u32) -> Money {
        Money(self.0 * n as i64)
    }

    pub fn max_zero(self) -> Money {
        Money(self.0.max(0))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Money::from_major)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(50.0).cents(), 5000);
        assert_eq!(Money::from_major(12.34).cents(), 1234);
        assert_eq!(Money::from_major(f64::NAN), Money::ZERO);
        assert_eq!(Money::from_major(f64::INFINITY), Money::ZERO);
    }

    #[test]
    fn hourly_rate_over_minutes() {
        // $50/hr for 90 minutes
        assert_eq!(Money::from_cents(5000).for_minutes(90).cents(), 7500);
        // $50/hr for a 15-minute step
        assert_eq!(Money::from_cents(5000).for_minutes(15).cents(), 1250);
        // odd rate rounds half up
        assert_eq!(Money::from_cents(4999).for_minutes(15).cents(), 1250);
    }

    #[test]
    fn arithmetic_and_floor() {
        let total = Money::from_cents(1000) + Money::from_cents(500) - Money::from_cents(2000);
        assert_eq!(total.cents(), -500);
        assert_eq!(total.max_zero(), Money::ZERO);
    }

    #[test]
    fn sums_over_iterator() {
        let parts = [Money::from_cents(100), Money::from_cents(250)];
        let sum: Money = parts.into_iter().sum();
        assert_eq!(sum.cents(), 350);
    }

    #[test]
    fn displays_with_two_decimals() {
        assert_eq!(Money::from_cents(5000).to_string(), "$50.00");
        assert_eq!(Money::from_cents(705).to_string(), "$7.05");
        assert_eq!(Money::from_cents(-200).to_string(), "-$2.00");
    }

    #[test]
    fn serde_uses_decimal_numbers() {
        let json = serde_json::to_string(&Money::from_major(19.5)).unwrap();
        assert_eq!(json, "19.5");
        let back: Money = serde_json::from_str("19.5").unwrap();
        assert_eq!(back.cents(), 1950);
    }
}
