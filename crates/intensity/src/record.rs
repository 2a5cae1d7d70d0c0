//! Consumption records - input only, never mutated by the engine

use fueleu_core::{FuelType, ShipId, Year};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One fuel consumption line for a ship-year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub ship_id: ShipId,
    pub year: Year,
    pub fuel: FuelType,
    /// Mass consumed, in tonnes
    pub quantity: Decimal,
    /// Well-to-wake emission factor, gCO2e/MJ
    pub emission_factor: Decimal,
    /// Lower calorific value, MJ/t. Falls back to configuration when absent.
    #[serde(default)]
    pub lcv: Option<Decimal>,
    /// Renewable (e.g. RFNBO) fuel
    #[serde(default)]
    pub renewable: bool,
}

impl ConsumptionRecord {
    pub fn new(
        ship_id: ShipId,
        year: Year,
        fuel: FuelType,
        quantity: Decimal,
        emission_factor: Decimal,
    ) -> Self {
        Self {
            ship_id,
            year,
            fuel,
            quantity,
            emission_factor,
            lcv: None,
            renewable: false,
        }
    }

    /// Set an explicit calorific value
    pub fn with_lcv(mut self, lcv: Decimal) -> Self {
        self.lcv = Some(lcv);
        self
    }

    /// Flag the record as renewable
    pub fn renewable(mut self) -> Self {
        self.renewable = true;
        self
    }
}
