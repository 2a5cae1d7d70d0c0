//! Declining target-intensity schedule
//!
//! The target for a year is the reference intensity reduced by the most
//! recent step at or before that year. Years before the first step have no
//! target.

use fueleu_core::Year;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{IntensityError, IntensityResult};

/// Reference intensity plus stepwise percentage reductions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSchedule {
    /// gCO2e/MJ
    pub reference_intensity: Decimal,
    /// Year the step takes effect -> reduction in percent
    pub reductions: BTreeMap<Year, Decimal>,
}

impl TargetSchedule {
    pub fn new(reference_intensity: Decimal) -> Self {
        Self {
            reference_intensity,
            reductions: BTreeMap::new(),
        }
    }

    /// Add a reduction step (percent) effective from `year`
    pub fn with_step(mut self, year: Year, reduction_percent: Decimal) -> Self {
        self.reductions.insert(year, reduction_percent);
        self
    }

    /// FuelEU Maritime schedule: 91.16 gCO2e/MJ reference,
    /// -2% from 2025 down to -80% from 2050.
    pub fn fuel_eu_maritime() -> Self {
        Self::new(Decimal::new(9116, 2))
            .with_step(2025, Decimal::from(2))
            .with_step(2030, Decimal::from(6))
            .with_step(2035, Decimal::new(145, 1))
            .with_step(2040, Decimal::from(31))
            .with_step(2045, Decimal::from(62))
            .with_step(2050, Decimal::from(80))
    }

    /// Target intensity for a year
    pub fn target_for(&self, year: Year) -> IntensityResult<Decimal> {
        let (_, reduction) = self
            .reductions
            .range(..=year)
            .next_back()
            .ok_or(IntensityError::NoTarget(year))?;

        let factor = Decimal::ONE - reduction / Decimal::ONE_HUNDRED;
        Ok(self.reference_intensity * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fuel_eu_steps() {
        let schedule = TargetSchedule::fuel_eu_maritime();

        assert_eq!(schedule.target_for(2025).unwrap(), dec!(89.3368));
        assert_eq!(schedule.target_for(2029).unwrap(), dec!(89.3368));
        assert_eq!(schedule.target_for(2030).unwrap(), dec!(85.6904));
        assert_eq!(schedule.target_for(2050).unwrap(), dec!(18.232));
        assert_eq!(schedule.target_for(2060).unwrap(), dec!(18.232));
    }

    #[test]
    fn test_year_before_first_step_has_no_target() {
        let schedule = TargetSchedule::fuel_eu_maritime();
        assert_eq!(schedule.target_for(2024), Err(IntensityError::NoTarget(2024)));
    }

    #[test]
    fn test_targets_never_increase() {
        let schedule = TargetSchedule::fuel_eu_maritime();
        let targets: Vec<Decimal> = (2025..=2050)
            .map(|y| schedule.target_for(y).unwrap())
            .collect();
        assert!(targets.windows(2).all(|w| w[1] <= w[0]));
    }
}
