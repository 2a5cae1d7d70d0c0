//! ComplianceBalance - Signed CB value
//!
//! Sign convention is fixed across every entity:
//! positive = surplus, negative = deficit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

use crate::amount::Amount;

/// Signed compliance balance (tCO2e)
///
/// # Example
/// ```
/// use fueleu_core::ComplianceBalance;
/// use rust_decimal::Decimal;
///
/// let cb = ComplianceBalance::new(Decimal::new(-50, 0));
/// assert!(cb.is_deficit());
/// assert_eq!(cb.deficit().value(), Decimal::new(50, 0));
/// assert!(cb.surplus().is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplianceBalance(Decimal);

impl ComplianceBalance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Strictly positive balance
    pub fn is_surplus(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Strictly negative balance
    pub fn is_deficit(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Surplus magnitude, zero for a deficit
    pub fn surplus(&self) -> Amount {
        Amount::new_unchecked(self.0.max(Decimal::ZERO))
    }

    /// Deficit magnitude, zero for a surplus
    pub fn deficit(&self) -> Amount {
        Amount::new_unchecked((-self.0).max(Decimal::ZERO))
    }

    /// Balance raised by an amount
    pub fn credit(self, amount: Amount) -> Self {
        Self(self.0 + amount.value())
    }

    /// Balance lowered by an amount
    pub fn debit(self, amount: Amount) -> Self {
        Self(self.0 - amount.value())
    }
}

impl fmt::Display for ComplianceBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for ComplianceBalance {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<ComplianceBalance> for Decimal {
    fn from(balance: ComplianceBalance) -> Self {
        balance.0
    }
}

impl Add for ComplianceBalance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for ComplianceBalance {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for ComplianceBalance {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for ComplianceBalance {
    fn sum<I: Iterator<Item = ComplianceBalance>>(iter: I) -> Self {
        Self(iter.map(|b| b.0).sum())
    }
}

impl Default for ComplianceBalance {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sign_helpers() {
        let surplus = ComplianceBalance::new(dec!(12.5));
        assert!(surplus.is_surplus());
        assert!(!surplus.is_deficit());
        assert_eq!(surplus.surplus().value(), dec!(12.5));
        assert!(surplus.deficit().is_zero());

        let zero = ComplianceBalance::ZERO;
        assert!(!zero.is_surplus());
        assert!(!zero.is_deficit());
    }

    #[test]
    fn test_credit_and_debit() {
        let cb = ComplianceBalance::new(dec!(-50));
        let amount = Amount::new(dec!(80)).unwrap();
        assert_eq!(cb.credit(amount).value(), dec!(30));
        assert_eq!(cb.debit(amount).value(), dec!(-130));
    }

    #[test]
    fn test_sum_conserves_sign() {
        let total: ComplianceBalance = [dec!(-20), dec!(50), dec!(10)]
            .into_iter()
            .map(ComplianceBalance::new)
            .sum();
        assert_eq!(total.value(), dec!(40));
    }
}
