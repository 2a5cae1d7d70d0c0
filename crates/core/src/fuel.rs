//! FuelType - Type-safe fuel codes
//!
//! Common marine fuels are pre-defined with their default lower calorific
//! value (LCV). Other fuels use the `Other` variant and must carry their LCV
//! on the consumption record or in configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing fuel codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FuelTypeError {
    #[error("Empty fuel code")]
    EmptyCode,

    #[error("Fuel code too long (max 16 chars): {0}")]
    TooLong(String),

    #[error("Invalid fuel code format: {0}")]
    InvalidFormat(String),
}

/// Marine fuel codes
///
/// # Examples
/// ```
/// use fueleu_core::FuelType;
///
/// let hfo: FuelType = "hfo".parse().unwrap();
/// assert_eq!(hfo, FuelType::Hfo);
/// assert!(hfo.default_lcv().is_some());
///
/// let custom: FuelType = "BIO-LNG".parse().unwrap();
/// assert!(matches!(custom, FuelType::Other(_)));
/// assert!(custom.default_lcv().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FuelType {
    // === Fossil ===
    /// Heavy fuel oil
    Hfo,
    /// Light fuel oil
    Lfo,
    /// Marine gas oil
    Mgo,
    /// Marine diesel oil
    Mdo,
    /// Liquefied natural gas
    Lng,

    // === Alternative ===
    Methanol,
    Ammonia,
    Hydrogen,

    /// Any other fuel (biofuels, e-fuels, blends)
    Other(String),
}

impl FuelType {
    /// Returns the fuel code as a string slice
    pub fn code(&self) -> &str {
        match self {
            FuelType::Hfo => "HFO",
            FuelType::Lfo => "LFO",
            FuelType::Mgo => "MGO",
            FuelType::Mdo => "MDO",
            FuelType::Lng => "LNG",
            FuelType::Methanol => "METHANOL",
            FuelType::Ammonia => "AMMONIA",
            FuelType::Hydrogen => "HYDROGEN",
            FuelType::Other(s) => s.as_str(),
        }
    }

    /// Default lower calorific value in MJ per tonne
    pub fn default_lcv(&self) -> Option<Decimal> {
        let mj_per_tonne = match self {
            FuelType::Hfo => 40_200,
            FuelType::Lfo => 41_000,
            FuelType::Mgo | FuelType::Mdo => 42_700,
            FuelType::Lng => 49_100,
            FuelType::Methanol => 19_900,
            FuelType::Ammonia => 18_600,
            FuelType::Hydrogen => 120_000,
            FuelType::Other(_) => return None,
        };
        Some(Decimal::from(mj_per_tonne))
    }

    /// Returns true for fossil fuels
    pub fn is_fossil(&self) -> bool {
        matches!(
            self,
            FuelType::Hfo | FuelType::Lfo | FuelType::Mgo | FuelType::Mdo | FuelType::Lng
        )
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for FuelType {
    type Err = FuelTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(FuelTypeError::EmptyCode);
        }

        if s.len() > 16 {
            return Err(FuelTypeError::TooLong(s));
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(FuelTypeError::InvalidFormat(s));
        }

        Ok(match s.as_str() {
            "HFO" => FuelType::Hfo,
            "LFO" => FuelType::Lfo,
            "MGO" => FuelType::Mgo,
            "MDO" => FuelType::Mdo,
            "LNG" => FuelType::Lng,
            "METHANOL" => FuelType::Methanol,
            "AMMONIA" => FuelType::Ammonia,
            "HYDROGEN" => FuelType::Hydrogen,
            _ => FuelType::Other(s),
        })
    }
}

impl TryFrom<String> for FuelType {
    type Error = FuelTypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FuelType> for String {
    fn from(f: FuelType) -> Self {
        f.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_known_fuels() {
        assert_eq!("HFO".parse::<FuelType>().unwrap(), FuelType::Hfo);
        assert_eq!("lng".parse::<FuelType>().unwrap(), FuelType::Lng);
        assert_eq!(" mgo ".parse::<FuelType>().unwrap(), FuelType::Mgo);
        assert_eq!("Methanol".parse::<FuelType>().unwrap(), FuelType::Methanol);
    }

    #[test]
    fn test_parse_other_fuel() {
        let fuel: FuelType = "b30".parse().unwrap();
        assert_eq!(fuel, FuelType::Other("B30".to_string()));
        assert_eq!(fuel.to_string(), "B30");
    }

    #[test]
    fn test_default_lcv() {
        assert_eq!(FuelType::Hfo.default_lcv(), Some(dec!(40200)));
        assert_eq!(FuelType::Mdo.default_lcv(), FuelType::Mgo.default_lcv());
        assert_eq!(FuelType::Other("X".into()).default_lcv(), None);
    }

    #[test]
    fn test_is_fossil() {
        assert!(FuelType::Hfo.is_fossil());
        assert!(!FuelType::Hydrogen.is_fossil());
    }

    #[test]
    fn test_errors() {
        assert!(matches!("".parse::<FuelType>(), Err(FuelTypeError::EmptyCode)));
        assert!(matches!(
            "AVERYLONGFUELNAME123".parse::<FuelType>(),
            Err(FuelTypeError::TooLong(_))
        ));
        assert!(matches!(
            "HFO/LFO".parse::<FuelType>(),
            Err(FuelTypeError::InvalidFormat(_))
        ));
    }
}
