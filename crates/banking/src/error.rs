//! Banking ledger errors
//!
//! Business-rule violations are reported, never silently adjusted.

use fueleu_core::{Amount, ComplianceBalance, ShipId, Year};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankingError {
    #[error("Amount must be positive")]
    NonPositiveAmount,

    #[error("No compliance snapshot for {ship_id} in {year}")]
    SnapshotMissing { ship_id: ShipId, year: Year },

    #[error("Insufficient surplus for {ship_id} in {year}: available {available}, requested {requested}")]
    InsufficientSurplus {
        ship_id: ShipId,
        year: Year,
        available: Amount,
        requested: Amount,
    },

    #[error("{ship_id} is not in deficit in {year} (CB after pooling {balance})")]
    NotInDeficit {
        ship_id: ShipId,
        year: Year,
        balance: ComplianceBalance,
    },

    #[error("Borrowing {requested} exceeds the {year} deficit of {deficit}")]
    ExceedsDeficit {
        year: Year,
        deficit: Amount,
        requested: Amount,
    },

    #[error("Borrowing {requested} exceeds cap {cap}")]
    ExceedsBorrowingCap { requested: Amount, cap: Amount },

    #[error("{ship_id} already borrowed in {year}")]
    AlreadyBorrowed { ship_id: ShipId, year: Year },

    #[error("{ship_id} borrowed in {previous_year}; consecutive borrowing is not allowed")]
    ConsecutiveBorrowing { ship_id: ShipId, previous_year: Year },

    #[error("Entry belongs to {actual}, ledger is for {expected}")]
    ShipMismatch { expected: ShipId, actual: ShipId },

    #[error("Corrupt banking entry {sequence}: {reason}")]
    CorruptEntry { sequence: u64, reason: &'static str },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

/// Result type for banking operations
pub type BankingResult<T> = Result<T, BankingError>;
