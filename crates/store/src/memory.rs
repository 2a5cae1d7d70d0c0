//! In-memory CompliancePort

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use fueleu_banking::BankingEntry;
use fueleu_core::{ShipId, Year};
use fueleu_intensity::{ComplianceSnapshot, ConsumptionRecord};
use fueleu_pooling::PoolFormation;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{PortError, PortResult};
use crate::port::{CompliancePort, UnitOfWork};

#[derive(Debug, Default)]
struct State {
    records: Vec<ConsumptionRecord>,
    targets: HashMap<Year, Decimal>,
    snapshots: HashMap<(ShipId, Year), ComplianceSnapshot>,
    /// ship -> sequence -> entry
    entries: HashMap<ShipId, BTreeMap<u64, BankingEntry>>,
    pools: HashMap<String, PoolFormation>,
    memberships: HashMap<(ShipId, Year), String>,
}

/// Mutex-guarded maps. A commit validates the whole unit before applying
/// any of it.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| PortError::Poisoned)
    }
}

impl CompliancePort for InMemoryStore {
    fn load_consumption_records(
        &self,
        ship_id: &ShipId,
        year: Year,
    ) -> PortResult<Vec<ConsumptionRecord>> {
        let state = self.lock()?;
        Ok(state
            .records
            .iter()
            .filter(|r| &r.ship_id == ship_id && r.year == year)
            .cloned()
            .collect())
    }

    fn load_target_intensity(&self, year: Year) -> PortResult<Option<Decimal>> {
        Ok(self.lock()?.targets.get(&year).copied())
    }

    fn load_banking_entries(&self, ship_id: &ShipId) -> PortResult<Vec<BankingEntry>> {
        let state = self.lock()?;
        Ok(state
            .entries
            .get(ship_id)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }

    fn load_compliance_snapshot(
        &self,
        ship_id: &ShipId,
        year: Year,
    ) -> PortResult<Option<ComplianceSnapshot>> {
        let state = self.lock()?;
        Ok(state.snapshots.get(&(ship_id.clone(), year)).cloned())
    }

    fn load_pool_membership(&self, ship_id: &ShipId, year: Year) -> PortResult<Option<String>> {
        let state = self.lock()?;
        Ok(state.memberships.get(&(ship_id.clone(), year)).cloned())
    }

    fn load_pool(&self, pool_id: &str) -> PortResult<Option<PoolFormation>> {
        Ok(self.lock()?.pools.get(pool_id).cloned())
    }

    fn save_consumption_record(&self, record: &ConsumptionRecord) -> PortResult<()> {
        self.lock()?.records.push(record.clone());
        Ok(())
    }

    fn save_target_intensity(&self, year: Year, intensity: Decimal) -> PortResult<()> {
        self.lock()?.targets.insert(year, intensity);
        Ok(())
    }

    fn commit(&self, unit: UnitOfWork) -> PortResult<()> {
        let mut state = self.lock()?;

        // Validate
        for snapshot in &unit.snapshots {
            let key = (snapshot.ship_id.clone(), snapshot.year);
            if let Some(existing) = state.snapshots.get(&key) {
                if existing != snapshot {
                    return Err(PortError::ImmutableSnapshot {
                        ship_id: key.0,
                        year: key.1,
                    });
                }
            }
        }
        if let Some(formation) = &unit.pool {
            let pool = &formation.pool;
            if state.pools.contains_key(&pool.pool_id) {
                return Err(PortError::DuplicatePool(pool.pool_id.clone()));
            }
            for ship_id in &pool.members {
                if let Some(pool_id) = state.memberships.get(&(ship_id.clone(), pool.year)) {
                    return Err(PortError::MembershipConflict {
                        ship_id: ship_id.clone(),
                        year: pool.year,
                        pool_id: pool_id.clone(),
                    });
                }
            }
        }

        // Apply
        for snapshot in unit.snapshots {
            state
                .snapshots
                .insert((snapshot.ship_id.clone(), snapshot.year), snapshot);
        }
        for entry in unit.banking_entries {
            state
                .entries
                .entry(entry.ship_id.clone())
                .or_default()
                .insert(entry.sequence, entry);
        }
        if let Some(formation) = unit.pool {
            let pool = &formation.pool;
            for ship_id in &pool.members {
                state
                    .memberships
                    .insert((ship_id.clone(), pool.year), pool.pool_id.clone());
            }
            debug!(pool_id = %pool.pool_id, "Pool stored");
            state.pools.insert(pool.pool_id.clone(), formation);
        }

        Ok(())
    }
}
