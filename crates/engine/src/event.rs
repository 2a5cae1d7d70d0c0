//! Engine events (written to the audit journal)
//!
//! One or more events follow every successful commit. Events are
//! append-only and never edited.

use chrono::{DateTime, Utc};
use fueleu_banking::Draw;
use fueleu_core::{Amount, ComplianceBalance, ShipId, Year};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EngineEvent {
    SnapshotComputed {
        id: String,
        ship_id: ShipId,
        year: Year,
        raw_cb: ComplianceBalance,
        timestamp: DateTime<Utc>,
    },

    SurplusBanked {
        id: String,
        ship_id: ShipId,
        year: Year,
        sequence: u64,
        amount: Amount,
        timestamp: DateTime<Utc>,
    },

    /// Banked surplus drawn for a deficit year
    DeficitCovered {
        id: String,
        ship_id: ShipId,
        year: Year,
        covered: Amount,
        uncovered: Amount,
        draws: Vec<Draw>,
        timestamp: DateTime<Utc>,
    },

    /// Banked entries forfeited past their window
    EntriesExpired {
        id: String,
        ship_id: ShipId,
        year: Year,
        sequences: Vec<u64>,
        timestamp: DateTime<Utc>,
    },

    BorrowingRecorded {
        id: String,
        ship_id: ShipId,
        year: Year,
        sequence: u64,
        amount: Amount,
        repay_by: Year,
        timestamp: DateTime<Utc>,
    },

    BorrowingRepaid {
        id: String,
        ship_id: ShipId,
        year: Year,
        repaid: Amount,
        repayments: Vec<Draw>,
        timestamp: DateTime<Utc>,
    },

    PoolFormed {
        id: String,
        pool_id: String,
        year: Year,
        members: Vec<ShipId>,
        aggregate: ComplianceBalance,
        timestamp: DateTime<Utc>,
    },
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl EngineEvent {
    pub fn id(&self) -> &str {
        match self {
            EngineEvent::SnapshotComputed { id, .. }
            | EngineEvent::SurplusBanked { id, .. }
            | EngineEvent::DeficitCovered { id, .. }
            | EngineEvent::EntriesExpired { id, .. }
            | EngineEvent::BorrowingRecorded { id, .. }
            | EngineEvent::BorrowingRepaid { id, .. }
            | EngineEvent::PoolFormed { id, .. } => id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            EngineEvent::SnapshotComputed { timestamp, .. }
            | EngineEvent::SurplusBanked { timestamp, .. }
            | EngineEvent::DeficitCovered { timestamp, .. }
            | EngineEvent::EntriesExpired { timestamp, .. }
            | EngineEvent::BorrowingRecorded { timestamp, .. }
            | EngineEvent::BorrowingRepaid { timestamp, .. }
            | EngineEvent::PoolFormed { timestamp, .. } => *timestamp,
        }
    }

    /// Ship the event concerns; None for pool events
    pub fn ship_id(&self) -> Option<&ShipId> {
        match self {
            EngineEvent::SnapshotComputed { ship_id, .. }
            | EngineEvent::SurplusBanked { ship_id, .. }
            | EngineEvent::DeficitCovered { ship_id, .. }
            | EngineEvent::EntriesExpired { ship_id, .. }
            | EngineEvent::BorrowingRecorded { ship_id, .. }
            | EngineEvent::BorrowingRepaid { ship_id, .. } => Some(ship_id),
            EngineEvent::PoolFormed { .. } => None,
        }
    }

    pub fn snapshot_computed(ship_id: ShipId, year: Year, raw_cb: ComplianceBalance) -> Self {
        EngineEvent::SnapshotComputed {
            id: new_id(),
            ship_id,
            year,
            raw_cb,
            timestamp: Utc::now(),
        }
    }

    pub fn surplus_banked(ship_id: ShipId, year: Year, sequence: u64, amount: Amount) -> Self {
        EngineEvent::SurplusBanked {
            id: new_id(),
            ship_id,
            year,
            sequence,
            amount,
            timestamp: Utc::now(),
        }
    }

    pub fn deficit_covered(
        ship_id: ShipId,
        year: Year,
        covered: Amount,
        uncovered: Amount,
        draws: Vec<Draw>,
    ) -> Self {
        EngineEvent::DeficitCovered {
            id: new_id(),
            ship_id,
            year,
            covered,
            uncovered,
            draws,
            timestamp: Utc::now(),
        }
    }

    pub fn entries_expired(ship_id: ShipId, year: Year, sequences: Vec<u64>) -> Self {
        EngineEvent::EntriesExpired {
            id: new_id(),
            ship_id,
            year,
            sequences,
            timestamp: Utc::now(),
        }
    }

    pub fn borrowing_recorded(
        ship_id: ShipId,
        year: Year,
        sequence: u64,
        amount: Amount,
        repay_by: Year,
    ) -> Self {
        EngineEvent::BorrowingRecorded {
            id: new_id(),
            ship_id,
            year,
            sequence,
            amount,
            repay_by,
            timestamp: Utc::now(),
        }
    }

    pub fn borrowing_repaid(
        ship_id: ShipId,
        year: Year,
        repaid: Amount,
        repayments: Vec<Draw>,
    ) -> Self {
        EngineEvent::BorrowingRepaid {
            id: new_id(),
            ship_id,
            year,
            repaid,
            repayments,
            timestamp: Utc::now(),
        }
    }

    pub fn pool_formed(
        pool_id: impl Into<String>,
        year: Year,
        members: Vec<ShipId>,
        aggregate: ComplianceBalance,
    ) -> Self {
        EngineEvent::PoolFormed {
            id: new_id(),
            pool_id: pool_id.into(),
            year,
            members,
            aggregate,
            timestamp: Utc::now(),
        }
    }
}
