use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "THB";

//--------------------------------------       Money       -----------------------------------------------------------
/// A monetary amount in minor units (e.g. satang, cents). Price snapshots on orders and line items
/// are stored in this form so that no floating point ever enters a total.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a Money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = (self.0 / 100).abs();
        let frac = (self.0 % 100).abs();
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_whole(units: i64) -> Self {
        Self(units * 100)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Money::from(250);
        let b = Money::from(125);
        assert_eq!(a + b, Money::from(375));
        assert_eq!(a - b, Money::from(125));
        assert_eq!(-b, Money::from(-125));
        assert_eq!(a * 3, Money::from(750));
        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total, Money::from(500));
    }

    #[test]
    fn display_in_major_units() {
        assert_eq!(Money::from(123_45).to_string(), "123.45");
        assert_eq!(Money::from(5).to_string(), "0.05");
        assert_eq!(Money::from_whole(12).to_string(), "12.00");
    }

    #[test]
    fn display_keeps_the_sign_for_small_negative_amounts() {
        assert_eq!(Money::from(-45).to_string(), "-0.45");
        assert_eq!(Money::from(-123_45).to_string(), "-123.45");
        assert_eq!((Money::from(50) - Money::from(95)).to_string(), "-0.45");
    }
}
