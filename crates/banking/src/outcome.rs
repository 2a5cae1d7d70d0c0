//! Results reported by ledger operations

use fueleu_core::{Amount, ShipId, Year};
use serde::{Deserialize, Serialize};

/// Amount taken from one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub sequence: u64,
    pub origin_year: Year,
    pub amount: Amount,
}

/// Result of covering a deficit from banked surplus.
///
/// `covered + uncovered == requested`; a shortfall is reported here,
/// never clamped away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionOutcome {
    pub target_year: Year,
    pub requested: Amount,
    pub covered: Amount,
    pub uncovered: Amount,
    /// Draws in FIFO order
    pub drawn: Vec<Draw>,
    /// Sequences of entries expired by this call
    pub expired: Vec<u64>,
}

impl ConsumptionOutcome {
    pub fn is_fully_covered(&self) -> bool {
        self.uncovered.is_zero()
    }
}

/// Result of repaying borrowed advances from a surplus year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentOutcome {
    pub year: Year,
    pub available: Amount,
    pub repaid: Amount,
    pub repayments: Vec<Draw>,
}

/// A borrowed advance not repaid by its deadline.
///
/// This is a hard compliance violation to be reported upward; the entry
/// stays open and is never expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowingViolation {
    pub ship_id: ShipId,
    pub sequence: u64,
    pub origin_year: Year,
    pub repay_by: Year,
    pub outstanding: Amount,
}
