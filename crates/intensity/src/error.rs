//! Intensity calculation errors
//!
//! Every variant is malformed or impossible input data.

use fueleu_core::{FuelType, ShipId, Year};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntensityError {
    #[error("Total energy is zero for {ship_id} in {year}")]
    ZeroEnergy { ship_id: ShipId, year: Year },

    #[error("Record {index} has negative quantity: {quantity}")]
    NegativeQuantity { index: usize, quantity: Decimal },

    #[error("Record {index} has negative emission factor: {factor}")]
    NegativeEmissionFactor { index: usize, factor: Decimal },

    #[error("Record {index} has negative calorific value: {lcv}")]
    NegativeCalorificValue { index: usize, lcv: Decimal },

    #[error("No calorific value known for fuel {0}")]
    UnknownCalorificValue(FuelType),

    #[error("Record {index} belongs to {ship_id}/{year}, expected {expected_ship}/{expected_year}")]
    RecordMismatch {
        index: usize,
        ship_id: ShipId,
        year: Year,
        expected_ship: ShipId,
        expected_year: Year,
    },

    #[error("Target intensity must be positive, got {0}")]
    InvalidTarget(Decimal),

    #[error("No target intensity defined for {0}")]
    NoTarget(Year),

    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}

/// Result type for intensity calculations
pub type IntensityResult<T> = Result<T, IntensityError>;
