//! Compliance snapshot - one immutable record per ship-year

use fueleu_core::{ComplianceBalance, ShipId, Year};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of the intensity calculation for a ship-year.
///
/// Created once and never edited: a new year's data produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSnapshot {
    pub ship_id: ShipId,
    pub year: Year,
    /// gCO2e/MJ
    pub target_intensity: Decimal,
    /// gCO2e/MJ
    pub actual_intensity: Decimal,
    /// MJ
    pub total_energy: Decimal,
    /// Positive = surplus, negative = deficit
    pub raw_cb: ComplianceBalance,
}

impl ComplianceSnapshot {
    /// Surplus iff the ship beat its target
    pub fn is_surplus(&self) -> bool {
        self.raw_cb.is_surplus()
    }

    pub fn is_deficit(&self) -> bool {
        self.raw_cb.is_deficit()
    }
}
