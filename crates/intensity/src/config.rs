//! Intensity calculator configuration
//!
//! Every field has a serde default so a partial JSON document is enough.

use fueleu_core::FuelType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for the IntensityCalculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityConfig {
    /// Multiplier applied to the emission factor of renewable-flagged records.
    /// 0 removes them from the emissions numerator entirely.
    #[serde(default = "default_renewable_emission_multiplier")]
    pub renewable_emission_multiplier: Decimal,

    /// Divisor turning (gCO2e/MJ × MJ) into the accounting unit.
    /// 1 000 000 reports CB in tonnes CO2e.
    #[serde(default = "default_cb_unit_divisor")]
    pub cb_unit_divisor: Decimal,

    /// Per-fuel LCV overrides in MJ/t, consulted before the built-in defaults
    #[serde(default)]
    pub lcv_overrides: HashMap<FuelType, Decimal>,
}

fn default_renewable_emission_multiplier() -> Decimal {
    Decimal::ZERO
}

fn default_cb_unit_divisor() -> Decimal {
    Decimal::from(1_000_000)
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            renewable_emission_multiplier: default_renewable_emission_multiplier(),
            cb_unit_divisor: default_cb_unit_divisor(),
            lcv_overrides: HashMap::new(),
        }
    }
}

impl IntensityConfig {
    /// LCV for a fuel: override first, then the built-in table
    pub fn lcv_for(&self, fuel: &FuelType) -> Option<Decimal> {
        self.lcv_overrides
            .get(fuel)
            .copied()
            .or_else(|| fuel.default_lcv())
    }
}
