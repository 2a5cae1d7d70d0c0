//! FuelEU Intensity Calculator
//!
//! Turns a ship's per-year fuel consumption into an actual GHG intensity
//! (gCO2e/MJ) and a raw Compliance Balance against the year's target.
//!
//! ```text
//! ConsumptionRecord[] ──► IntensityCalculator ──► ComplianceSnapshot
//!                              ▲                    { target, actual, rawCB }
//!                              │
//!                     target intensity (TargetSchedule / port)
//! ```
//!
//! The calculator is pure: persistence of the snapshot is the caller's job.

pub mod calculator;
pub mod config;
pub mod error;
pub mod record;
pub mod snapshot;
pub mod target;

pub use calculator::IntensityCalculator;
pub use config::IntensityConfig;
pub use error::{IntensityError, IntensityResult};
pub use record::ConsumptionRecord;
pub use snapshot::ComplianceSnapshot;
pub use target::TargetSchedule;
