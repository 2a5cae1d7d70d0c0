//! FuelEU Ledger Core - Domain types
//!
//! This crate contains the fundamental types shared by every engine crate:
//! - `Amount`: Non-negative quantity of compliance balance (banked, borrowed, covered)
//! - `ComplianceBalance`: Signed CB, positive = surplus, negative = deficit
//! - `ShipId`: Normalised ship identifier
//! - `FuelType`: Fuel codes with default lower calorific values

pub mod amount;
pub mod balance;
pub mod fuel;
pub mod ship;

pub use amount::{Amount, AmountError};
pub use balance::ComplianceBalance;
pub use fuel::{FuelType, FuelTypeError};
pub use ship::{ShipId, ShipIdError};

/// Compliance (reporting) year
pub type Year = i32;
