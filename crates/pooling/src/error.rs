//! Pool formation errors

use fueleu_core::{ComplianceBalance, ShipId, Year};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("A pool needs at least {required} distinct members, got {actual}")]
    TooFewMembers { required: usize, actual: usize },

    #[error("No adjusted balance supplied for {0}")]
    MissingBalance(ShipId),

    #[error("{ship_id} already belongs to pool {pool_id} for {year}")]
    MembershipConflict {
        ship_id: ShipId,
        year: Year,
        pool_id: String,
    },

    #[error("Pool aggregate {aggregate} is negative; pool would remain in deficit")]
    NonCompliant { aggregate: ComplianceBalance },

    #[error("{ship_id} would be worse off: pre {pre_cb}, post {post_cb}")]
    FairnessViolation {
        ship_id: ShipId,
        pre_cb: ComplianceBalance,
        post_cb: ComplianceBalance,
    },

    #[error("Allocation does not conserve balance: pre {pre_total}, post {post_total}")]
    ConservationViolation {
        pre_total: ComplianceBalance,
        post_total: ComplianceBalance,
    },
}

/// Result type for pooling operations
pub type PoolResult<T> = Result<T, PoolError>;
