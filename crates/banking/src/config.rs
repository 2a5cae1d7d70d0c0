//! Banking configuration
//!
//! The eligibility window, borrowing cap and repayment deadline come from
//! the governing regulation text. They have no defaults: a config document
//! that omits them does not deserialize.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BankingError, BankingResult};

/// Configuration for the BankingLedger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankingConfig {
    /// Years after the origin year during which banked surplus may be used
    pub banking_window_years: u32,

    /// Maximum borrowing as a fraction (0..=1) of expected next-year surplus
    pub borrowing_cap: Decimal,

    /// Years after the borrowing year by which the advance must be repaid
    pub repayment_deadline_years: u32,

    /// Whether a ship may borrow in two consecutive years
    #[serde(default)]
    pub allow_consecutive_borrowing: bool,
}

impl BankingConfig {
    pub fn new(
        banking_window_years: u32,
        borrowing_cap: Decimal,
        repayment_deadline_years: u32,
    ) -> Self {
        Self {
            banking_window_years,
            borrowing_cap,
            repayment_deadline_years,
            allow_consecutive_borrowing: false,
        }
    }

    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Check value ranges
    pub fn validate(&self) -> BankingResult<()> {
        if self.banking_window_years == 0 {
            return Err(BankingError::InvalidConfig(
                "banking_window_years must be at least 1".to_string(),
            ));
        }
        if self.borrowing_cap < Decimal::ZERO || self.borrowing_cap > Decimal::ONE {
            return Err(BankingError::InvalidConfig(format!(
                "borrowing_cap must be within 0..=1, got {}",
                self.borrowing_cap
            )));
        }
        if self.repayment_deadline_years == 0 {
            return Err(BankingError::InvalidConfig(
                "repayment_deadline_years must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
