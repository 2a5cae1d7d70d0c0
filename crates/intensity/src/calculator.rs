//! Intensity calculator
//!
//! actual intensity = Σ(energy × effective factor) / Σ energy
//! raw CB           = (target − actual) × Σ energy / unit divisor
//!
//! The raw CB is evaluated as `(target × Σ energy − Σ emissions) / divisor`
//! so no rounded intermediate enters it.

use fueleu_core::{ComplianceBalance, ShipId, Year};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::IntensityConfig;
use crate::error::{IntensityError, IntensityResult};
use crate::record::ConsumptionRecord;
use crate::snapshot::ComplianceSnapshot;

/// Converts consumption records into a ComplianceSnapshot
#[derive(Debug, Clone, Default)]
pub struct IntensityCalculator {
    config: IntensityConfig,
}

/// Energy and emissions totals for a record set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Totals {
    energy: Decimal,
    emissions: Decimal,
}

impl IntensityCalculator {
    pub fn new(config: IntensityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IntensityConfig {
        &self.config
    }

    /// Compute the snapshot for one ship-year.
    ///
    /// Fails with an `IntensityError` if total energy is zero, a record is
    /// negative, or a record belongs to another ship-year.
    pub fn compute_snapshot(
        &self,
        ship_id: &ShipId,
        year: Year,
        records: &[ConsumptionRecord],
        target_intensity: Decimal,
    ) -> IntensityResult<ComplianceSnapshot> {
        if target_intensity <= Decimal::ZERO {
            return Err(IntensityError::InvalidTarget(target_intensity));
        }

        let totals = self.totals(ship_id, year, records)?;
        if totals.energy.is_zero() {
            return Err(IntensityError::ZeroEnergy {
                ship_id: ship_id.clone(),
                year,
            });
        }

        let actual_intensity = totals
            .emissions
            .checked_div(totals.energy)
            .ok_or(IntensityError::Overflow("actual intensity"))?;

        let raw = target_intensity
            .checked_mul(totals.energy)
            .and_then(|allowed| allowed.checked_sub(totals.emissions))
            .and_then(|diff| diff.checked_div(self.config.cb_unit_divisor))
            .ok_or(IntensityError::Overflow("compliance balance"))?;

        debug!(
            ship = %ship_id,
            year,
            energy = %totals.energy,
            actual = %actual_intensity,
            target = %target_intensity,
            raw_cb = %raw,
            "Computed compliance snapshot"
        );

        Ok(ComplianceSnapshot {
            ship_id: ship_id.clone(),
            year,
            target_intensity,
            actual_intensity,
            total_energy: totals.energy,
            raw_cb: ComplianceBalance::new(raw),
        })
    }

    fn totals(
        &self,
        ship_id: &ShipId,
        year: Year,
        records: &[ConsumptionRecord],
    ) -> IntensityResult<Totals> {
        let mut totals = Totals {
            energy: Decimal::ZERO,
            emissions: Decimal::ZERO,
        };

        for (index, record) in records.iter().enumerate() {
            if &record.ship_id != ship_id || record.year != year {
                return Err(IntensityError::RecordMismatch {
                    index,
                    ship_id: record.ship_id.clone(),
                    year: record.year,
                    expected_ship: ship_id.clone(),
                    expected_year: year,
                });
            }
            if record.quantity < Decimal::ZERO {
                return Err(IntensityError::NegativeQuantity {
                    index,
                    quantity: record.quantity,
                });
            }
            if record.emission_factor < Decimal::ZERO {
                return Err(IntensityError::NegativeEmissionFactor {
                    index,
                    factor: record.emission_factor,
                });
            }

            let lcv = record
                .lcv
                .or_else(|| self.config.lcv_for(&record.fuel))
                .ok_or_else(|| IntensityError::UnknownCalorificValue(record.fuel.clone()))?;
            if lcv < Decimal::ZERO {
                return Err(IntensityError::NegativeCalorificValue { index, lcv });
            }

            let factor = if record.renewable {
                record.emission_factor * self.config.renewable_emission_multiplier
            } else {
                record.emission_factor
            };

            let energy = record
                .quantity
                .checked_mul(lcv)
                .ok_or(IntensityError::Overflow("energy"))?;
            let emissions = energy
                .checked_mul(factor)
                .ok_or(IntensityError::Overflow("emissions"))?;

            totals.energy = totals
                .energy
                .checked_add(energy)
                .ok_or(IntensityError::Overflow("energy"))?;
            totals.emissions = totals
                .emissions
                .checked_add(emissions)
                .ok_or(IntensityError::Overflow("emissions"))?;
        }

        Ok(totals)
    }
}
