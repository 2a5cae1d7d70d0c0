//! Persistence errors

use fueleu_core::{ShipId, Year};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("Snapshot for {ship_id} in {year} already exists with different values")]
    ImmutableSnapshot { ship_id: ShipId, year: Year },

    #[error("{ship_id} already belongs to pool {pool_id} for {year}")]
    MembershipConflict {
        ship_id: ShipId,
        year: Year,
        pool_id: String,
    },

    #[error("Pool already exists: {0}")]
    DuplicatePool(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt stored value in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for port operations
pub type PortResult<T> = Result<T, PortError>;
