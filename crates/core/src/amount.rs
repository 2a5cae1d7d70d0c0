//! Amount - a magnitude of compliance balance in tCO2e
//!
//! Banked surplus, advances, deficit requests and draws never carry a sign;
//! the sign lives on `ComplianceBalance`. Ledger arithmetic on amounts
//! clamps at zero instead of going negative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Negative quantity of compliance balance: {0}")]
    NegativeAmount(Decimal),
}

/// Non-negative tCO2e quantity.
///
/// ```
/// use fueleu_core::Amount;
/// use rust_decimal::Decimal;
///
/// let banked = Amount::new(Decimal::new(80, 0)).unwrap();
/// let drawn = Amount::new(Decimal::new(50, 0)).unwrap();
/// assert_eq!(banked.saturating_sub(&drawn).value(), Decimal::new(30, 0));
/// assert!(drawn.saturating_sub(&banked).is_zero());
///
/// assert!(Amount::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::NegativeAmount(value));
        }
        Ok(Self(value))
    }

    /// For values non-negative by construction, such as the positive part
    /// of a balance or a cap computed from two amounts.
    #[inline]
    pub const fn new_unchecked(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self − other`, or zero when `other` is larger
    pub fn saturating_sub(&self, other: &Amount) -> Amount {
        if other.0 >= self.0 {
            Amount::ZERO
        } else {
            Amount(self.0 - other.0)
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.map(|a| a.0).sum())
    }
}
