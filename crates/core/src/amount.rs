use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Empty amount")]
    Empty,
    #[error("Not a numeric amount: '{0}'")]
    NotNumeric(String),
}

/// A signed decimal amount that always carries exactly two fraction digits.
///
/// A parsed `-0,00` keeps its sign and prints `-0.00`; it still compares
/// equal to `0.00`. Sums never produce a signed zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn zero() -> Self {
        Amount::from_decimal(Decimal::ZERO)
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        let mut d = decimal.round_dp(2);
        d.rescale(2);
        d.set_sign_negative(decimal.is_sign_negative());
        Amount(d)
    }

    /// Parse statement-formatted text (`.` thousands, `,` decimals, sign as a
    /// leading or trailing `-`).
    ///
    /// `"1.234,56"` → `1234.56`, `"45,00-"` → `-45.00`, `"12,,34"` → error.
    pub fn parse_localized(text: &str) -> Result<Self, AmountError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        let negative = trimmed.starts_with('-') || trimmed.ends_with('-');
        let unsigned = trimmed
            .strip_prefix('-')
            .unwrap_or(trimmed);
        let unsigned = unsigned.strip_suffix('-').unwrap_or(unsigned);

        let clean = unsigned.replace('.', "").replace(',', ".");
        if clean.is_empty() || !clean.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(AmountError::NotNumeric(text.to_string()));
        }

        let mut value = Decimal::from_str(&clean)
            .map_err(|_| AmountError::NotNumeric(text.to_string()))?;
        value.set_sign_negative(negative);

        Ok(Amount::from_decimal(value))
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Positive amounts are charges on the statement.
    pub fn is_charge(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Negative amounts are credits (refunds, payments).
    pub fn is_credit(self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses the canonical form produced by `Display` (`-1234.56`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut value =
            Decimal::from_str(trimmed).map_err(|_| AmountError::NotNumeric(s.to_string()))?;
        // Decimal parsing drops the sign of zero.
        if trimmed.starts_with('-') {
            value.set_sign_negative(true);
        }
        Ok(Amount::from_decimal(value))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let sum = self.0 + rhs.0;
        if sum.is_zero() {
            Amount::zero()
        } else {
            Amount::from_decimal(sum)
        }
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |a, b| a + b)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}
