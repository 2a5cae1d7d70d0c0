//! Engine errors
//!
//! Component errors are wrapped unchanged; `kind()` maps each onto the
//! caller-facing taxonomy. Nothing here is retried internally.

use fueleu_banking::BankingError;
use fueleu_core::{ShipId, Year};
use fueleu_intensity::IntensityError;
use fueleu_pooling::PoolError;
use fueleu_store::PortError;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Caller-facing error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or impossible input data
    InvalidInput,
    /// Business-rule violation
    Validation,
    /// Duplicate pool membership or a conflicting stored value
    Conflict,
    /// Pool aggregate below zero
    PoolNonCompliant,
    /// A pool allocation broke conservation or left a member worse off
    FairnessViolation,
    /// Persistence or journal failure
    Storage,
}

/// Audit journal errors
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Broken link at record {sequence}: expected prev_hash {expected}, got {actual}")]
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid hash at record {sequence}: expected {expected}, got {actual}")]
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid sequence: expected {expected}, got {actual}")]
    InvalidSequence { expected: u64, actual: u64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Intensity(#[from] IntensityError),

    #[error(transparent)]
    Banking(#[from] BankingError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("No compliance snapshot for {ship_id} in {year}")]
    SnapshotMissing { ship_id: ShipId, year: Year },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock for {0} poisoned")]
    LockPoisoned(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Intensity(_) => ErrorKind::InvalidInput,
            EngineError::Banking(e) => match e {
                BankingError::NonPositiveAmount
                | BankingError::ShipMismatch { .. }
                | BankingError::InvalidConfig(_) => ErrorKind::InvalidInput,
                BankingError::CorruptEntry { .. } => ErrorKind::Storage,
                _ => ErrorKind::Validation,
            },
            EngineError::Pool(e) => match e {
                PoolError::TooFewMembers { .. } | PoolError::MissingBalance(_) => {
                    ErrorKind::InvalidInput
                }
                PoolError::MembershipConflict { .. } => ErrorKind::Conflict,
                PoolError::NonCompliant { .. } => ErrorKind::PoolNonCompliant,
                PoolError::FairnessViolation { .. } | PoolError::ConservationViolation { .. } => {
                    ErrorKind::FairnessViolation
                }
            },
            EngineError::Port(e) => match e {
                PortError::ImmutableSnapshot { .. }
                | PortError::MembershipConflict { .. }
                | PortError::DuplicatePool(_) => ErrorKind::Conflict,
                _ => ErrorKind::Storage,
            },
            EngineError::SnapshotMissing { .. } => ErrorKind::Validation,
            EngineError::Config(_) => ErrorKind::InvalidInput,
            EngineError::Journal(_) | EngineError::LockPoisoned(_) => ErrorKind::Storage,
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fueleu_core::ComplianceBalance;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kind_mapping() {
        let ship: ShipId = "A".parse().unwrap();

        assert_eq!(
            EngineError::from(IntensityError::ZeroEnergy {
                ship_id: ship.clone(),
                year: 2025
            })
            .kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            EngineError::from(BankingError::AlreadyBorrowed {
                ship_id: ship.clone(),
                year: 2025
            })
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::from(PoolError::NonCompliant {
                aggregate: ComplianceBalance::new(dec!(-50))
            })
            .kind(),
            ErrorKind::PoolNonCompliant
        );
        assert_eq!(
            EngineError::from(PortError::MembershipConflict {
                ship_id: ship.clone(),
                year: 2025,
                pool_id: "P1".to_string()
            })
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(EngineError::from(PortError::Poisoned).kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(ErrorKind::PoolNonCompliant.to_string(), "pool_non_compliant");
        assert_eq!(ErrorKind::FairnessViolation.to_string(), "fairness_violation");
    }
}
