//! ShipId - Normalised ship identifier
//!
//! Ship identifiers are trimmed and uppercased so that "imo9876543" and
//! "IMO9876543" address the same ledger. Ordering is lexicographic on the
//! normalised form, which is the lock-acquisition order for pooling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length of a ship identifier
pub const MAX_SHIP_ID_LEN: usize = 32;

/// Errors that can occur when parsing ship identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShipIdError {
    #[error("Empty ship id")]
    Empty,

    #[error("Ship id too long (max {MAX_SHIP_ID_LEN} chars): {0}")]
    TooLong(String),

    #[error("Invalid ship id format: {0}")]
    InvalidFormat(String),
}

/// Ship identity (e.g. IMO number or fleet code)
///
/// # Examples
/// ```
/// use fueleu_core::ShipId;
///
/// let ship: ShipId = " imo9876543 ".parse().unwrap();
/// assert_eq!(ship.as_str(), "IMO9876543");
///
/// assert!("R-01".parse::<ShipId>().is_ok());
/// assert!("bad id".parse::<ShipId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShipId(String);

impl ShipId {
    /// Returns the normalised identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ShipId {
    type Err = ShipIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_uppercase();

        if s.is_empty() {
            return Err(ShipIdError::Empty);
        }

        if s.len() > MAX_SHIP_ID_LEN {
            return Err(ShipIdError::TooLong(s));
        }

        // Alphanumeric plus '-' and '_'
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ShipIdError::InvalidFormat(s));
        }

        Ok(ShipId(s))
    }
}

impl TryFrom<String> for ShipId {
    type Error = ShipIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&str> for ShipId {
    type Error = ShipIdError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ShipId> for String {
    fn from(id: ShipId) -> Self {
        id.0
    }
}

impl AsRef<str> for ShipId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
