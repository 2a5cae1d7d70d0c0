//! Pool records

use chrono::{DateTime, Utc};
use fueleu_core::{ComplianceBalance, ShipId, Year};
use serde::{Deserialize, Serialize};

/// A finalized pool; membership is immutable once formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub pool_id: String,
    pub year: Year,
    /// Distinct members in request order
    pub members: Vec<ShipId>,
    /// Σ pre-pool Adjusted CB
    pub aggregate_adjusted_cb: ComplianceBalance,
    pub created_at: DateTime<Utc>,
}

impl Pool {
    pub fn contains(&self, ship_id: &ShipId) -> bool {
        self.members.contains(ship_id)
    }
}

/// One member's outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAllocation {
    pub pool_id: String,
    pub ship_id: ShipId,
    pub pre_cb: ComplianceBalance,
    pub post_cb: ComplianceBalance,
    /// post_cb − pre_cb
    pub delta: ComplianceBalance,
}

impl PoolAllocation {
    pub fn new(
        pool_id: impl Into<String>,
        ship_id: ShipId,
        pre_cb: ComplianceBalance,
        post_cb: ComplianceBalance,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            ship_id,
            pre_cb,
            post_cb,
            delta: post_cb - pre_cb,
        }
    }
}
