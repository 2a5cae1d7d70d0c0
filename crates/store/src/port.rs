//! CompliancePort - the repository boundary the engine reads and writes through

use fueleu_banking::BankingEntry;
use fueleu_core::{ShipId, Year};
use fueleu_intensity::{ComplianceSnapshot, ConsumptionRecord};
use fueleu_pooling::PoolFormation;
use rust_decimal::Decimal;

use crate::error::PortResult;

/// Everything one engine call writes.
///
/// Adapters apply a unit all or nothing:
/// - snapshots are insert-only; an identical re-insert is a no-op, a
///   differing one fails with `ImmutableSnapshot`
/// - banking entries are upserted by `(ship_id, sequence)`
/// - a pool is rejected with `MembershipConflict` if any member already
///   belongs to a pool for that year
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitOfWork {
    pub snapshots: Vec<ComplianceSnapshot>,
    pub banking_entries: Vec<BankingEntry>,
    pub pool: Option<PoolFormation>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, snapshot: ComplianceSnapshot) -> Self {
        self.snapshots.push(snapshot);
        self
    }

    pub fn with_banking_entries(mut self, entries: impl IntoIterator<Item = BankingEntry>) -> Self {
        self.banking_entries.extend(entries);
        self
    }

    pub fn with_pool(mut self, formation: PoolFormation) -> Self {
        self.pool = Some(formation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty() && self.banking_entries.is_empty() && self.pool.is_none()
    }
}

/// Persistence port owned by the surrounding application
pub trait CompliancePort: Send + Sync {
    /// Consumption records for a ship-year, in insertion order
    fn load_consumption_records(&self, ship_id: &ShipId, year: Year)
        -> PortResult<Vec<ConsumptionRecord>>;

    /// Stored target intensity override for a year
    fn load_target_intensity(&self, year: Year) -> PortResult<Option<Decimal>>;

    /// Every banking entry of a ship, any status, ordered by sequence
    fn load_banking_entries(&self, ship_id: &ShipId) -> PortResult<Vec<BankingEntry>>;

    /// Open banking entries of a ship, ordered by sequence
    fn load_open_banking_entries(&self, ship_id: &ShipId) -> PortResult<Vec<BankingEntry>> {
        Ok(self
            .load_banking_entries(ship_id)?
            .into_iter()
            .filter(BankingEntry::is_open)
            .collect())
    }

    fn load_compliance_snapshot(
        &self,
        ship_id: &ShipId,
        year: Year,
    ) -> PortResult<Option<ComplianceSnapshot>>;

    /// Pool id the ship belongs to for `year`, if any
    fn load_pool_membership(&self, ship_id: &ShipId, year: Year) -> PortResult<Option<String>>;

    /// A formed pool with its allocation rows
    fn load_pool(&self, pool_id: &str) -> PortResult<Option<PoolFormation>>;

    fn save_consumption_record(&self, record: &ConsumptionRecord) -> PortResult<()>;

    fn save_target_intensity(&self, year: Year, intensity: Decimal) -> PortResult<()>;

    /// Apply a unit of work atomically
    fn commit(&self, unit: UnitOfWork) -> PortResult<()>;

    fn save_snapshot(&self, snapshot: &ComplianceSnapshot) -> PortResult<()> {
        self.commit(UnitOfWork::new().with_snapshot(snapshot.clone()))
    }

    fn save_banking_entries(&self, entries: &[BankingEntry]) -> PortResult<()> {
        self.commit(UnitOfWork::new().with_banking_entries(entries.iter().cloned()))
    }

    fn save_pool(&self, formation: &PoolFormation) -> PortResult<()> {
        self.commit(UnitOfWork::new().with_pool(formation.clone()))
    }
}
