//! SQLite CompliancePort
//!
//! Decimals are stored as TEXT to keep their exact scale. Every commit runs
//! inside one SQLite transaction.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use fueleu_banking::{BankingEntry, EntryKind, EntryStatus};
use fueleu_core::{Amount, ComplianceBalance, FuelType, ShipId, Year};
use fueleu_intensity::{ComplianceSnapshot, ConsumptionRecord};
use fueleu_pooling::{Pool, PoolAllocation, PoolFormation};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{PortError, PortResult};
use crate::port::{CompliancePort, UnitOfWork};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS consumption_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ship_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    fuel TEXT NOT NULL,
    quantity TEXT NOT NULL,
    emission_factor TEXT NOT NULL,
    lcv TEXT,
    renewable INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_consumption_ship_year
    ON consumption_records(ship_id, year);

CREATE TABLE IF NOT EXISTS target_intensities (
    year INTEGER PRIMARY KEY,
    intensity TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS compliance_snapshots (
    ship_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    target_intensity TEXT NOT NULL,
    actual_intensity TEXT NOT NULL,
    total_energy TEXT NOT NULL,
    raw_cb TEXT NOT NULL,
    PRIMARY KEY (ship_id, year)
);

CREATE TABLE IF NOT EXISTS banking_entries (
    ship_id TEXT NOT NULL,
    sequence INTEGER NOT NULL,
    origin_year INTEGER NOT NULL,
    kind TEXT NOT NULL,
    original_amount TEXT NOT NULL,
    remaining_amount TEXT NOT NULL,
    status TEXT NOT NULL,
    repay_by INTEGER,
    applications_json TEXT NOT NULL,
    PRIMARY KEY (ship_id, sequence)
);

CREATE TABLE IF NOT EXISTS pools (
    pool_id TEXT PRIMARY KEY,
    year INTEGER NOT NULL,
    members_json TEXT NOT NULL,
    aggregate_cb TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pool_allocations (
    pool_id TEXT NOT NULL REFERENCES pools(pool_id),
    ship_id TEXT NOT NULL,
    year INTEGER NOT NULL,
    position INTEGER NOT NULL,
    pre_cb TEXT NOT NULL,
    post_cb TEXT NOT NULL,
    delta TEXT NOT NULL,
    PRIMARY KEY (pool_id, ship_id),
    UNIQUE (ship_id, year)
);
";

/// SQLite-backed store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn new<P: AsRef<Path>>(path: P) -> PortResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> PortResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> PortResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| PortError::Poisoned)
    }
}

impl CompliancePort for SqliteStore {
    fn load_consumption_records(
        &self,
        ship_id: &ShipId,
        year: Year,
    ) -> PortResult<Vec<ConsumptionRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ship_id, year, fuel, quantity, emission_factor, lcv, renewable
             FROM consumption_records WHERE ship_id = ?1 AND year = ?2 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![ship_id.as_str(), year], RawRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRecord::parse).collect()
    }

    fn load_target_intensity(&self, year: Year) -> PortResult<Option<Decimal>> {
        let conn = self.lock()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT intensity FROM target_intensities WHERE year = ?1",
                params![year],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|v| decimal("target_intensities", &v))
            .transpose()
    }

    fn load_banking_entries(&self, ship_id: &ShipId) -> PortResult<Vec<BankingEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT ship_id, sequence, origin_year, kind, original_amount, remaining_amount,
                    status, repay_by, applications_json
             FROM banking_entries WHERE ship_id = ?1 ORDER BY sequence",
        )?;
        let rows = stmt
            .query_map(params![ship_id.as_str()], RawEntry::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawEntry::parse).collect()
    }

    fn load_compliance_snapshot(
        &self,
        ship_id: &ShipId,
        year: Year,
    ) -> PortResult<Option<ComplianceSnapshot>> {
        let conn = self.lock()?;
        find_snapshot(&conn, ship_id, year)
    }

    fn load_pool_membership(&self, ship_id: &ShipId, year: Year) -> PortResult<Option<String>> {
        let conn = self.lock()?;
        find_membership(&conn, ship_id, year)
    }

    fn load_pool(&self, pool_id: &str) -> PortResult<Option<PoolFormation>> {
        let conn = self.lock()?;

        let pool = conn
            .query_row(
                "SELECT pool_id, year, members_json, aggregate_cb, created_at
                 FROM pools WHERE pool_id = ?1",
                params![pool_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Year>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        let Some((pool_id, year, members_json, aggregate, created_at)) = pool else {
            return Ok(None);
        };

        let members: Vec<ShipId> = serde_json::from_str(&members_json)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| corrupt("pools", e))?
            .with_timezone(&Utc);

        let mut stmt = conn.prepare(
            "SELECT ship_id, pre_cb, post_cb FROM pool_allocations
             WHERE pool_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![pool_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut allocations = Vec::with_capacity(rows.len());
        for (ship_id, pre_cb, post_cb) in rows {
            allocations.push(PoolAllocation::new(
                pool_id.clone(),
                ship("pool_allocations", &ship_id)?,
                balance("pool_allocations", &pre_cb)?,
                balance("pool_allocations", &post_cb)?,
            ));
        }

        Ok(Some(PoolFormation {
            pool: Pool {
                pool_id,
                year,
                members,
                aggregate_adjusted_cb: balance("pools", &aggregate)?,
                created_at,
            },
            allocations,
        }))
    }

    fn save_consumption_record(&self, record: &ConsumptionRecord) -> PortResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO consumption_records
             (ship_id, year, fuel, quantity, emission_factor, lcv, renewable)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.ship_id.as_str(),
                record.year,
                record.fuel.code(),
                record.quantity.to_string(),
                record.emission_factor.to_string(),
                record.lcv.map(|v| v.to_string()),
                record.renewable,
            ],
        )?;
        Ok(())
    }

    fn save_target_intensity(&self, year: Year, intensity: Decimal) -> PortResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO target_intensities (year, intensity) VALUES (?1, ?2)",
            params![year, intensity.to_string()],
        )?;
        Ok(())
    }

    fn commit(&self, unit: UnitOfWork) -> PortResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for snapshot in &unit.snapshots {
            write_snapshot(&tx, snapshot)?;
        }
        for entry in &unit.banking_entries {
            write_entry(&tx, entry)?;
        }
        if let Some(formation) = &unit.pool {
            write_pool(&tx, formation)?;
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        debug!(
            snapshots = unit.snapshots.len(),
            entries = unit.banking_entries.len(),
            pool = unit.pool.is_some(),
            "Unit of work committed"
        );
        Ok(())
    }
}

fn find_snapshot(
    conn: &Connection,
    ship_id: &ShipId,
    year: Year,
) -> PortResult<Option<ComplianceSnapshot>> {
    let row = conn
        .query_row(
            "SELECT target_intensity, actual_intensity, total_energy, raw_cb
             FROM compliance_snapshots WHERE ship_id = ?1 AND year = ?2",
            params![ship_id.as_str(), year],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(target, actual, energy, raw_cb)| {
        const TABLE: &str = "compliance_snapshots";
        Ok(ComplianceSnapshot {
            ship_id: ship_id.clone(),
            year,
            target_intensity: decimal(TABLE, &target)?,
            actual_intensity: decimal(TABLE, &actual)?,
            total_energy: decimal(TABLE, &energy)?,
            raw_cb: balance(TABLE, &raw_cb)?,
        })
    })
    .transpose()
}

fn find_membership(conn: &Connection, ship_id: &ShipId, year: Year) -> PortResult<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT pool_id FROM pool_allocations WHERE ship_id = ?1 AND year = ?2",
            params![ship_id.as_str(), year],
            |row| row.get(0),
        )
        .optional()?)
}

fn write_snapshot(tx: &Transaction<'_>, snapshot: &ComplianceSnapshot) -> PortResult<()> {
    if let Some(existing) = find_snapshot(tx, &snapshot.ship_id, snapshot.year)? {
        if &existing != snapshot {
            return Err(PortError::ImmutableSnapshot {
                ship_id: snapshot.ship_id.clone(),
                year: snapshot.year,
            });
        }
        return Ok(());
    }

    tx.execute(
        "INSERT INTO compliance_snapshots
         (ship_id, year, target_intensity, actual_intensity, total_energy, raw_cb)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            snapshot.ship_id.as_str(),
            snapshot.year,
            snapshot.target_intensity.to_string(),
            snapshot.actual_intensity.to_string(),
            snapshot.total_energy.to_string(),
            snapshot.raw_cb.to_string(),
        ],
    )?;
    Ok(())
}

fn write_entry(tx: &Transaction<'_>, entry: &BankingEntry) -> PortResult<()> {
    let sequence = i64::try_from(entry.sequence).map_err(|e| corrupt("banking_entries", e))?;
    tx.execute(
        "INSERT OR REPLACE INTO banking_entries
         (ship_id, sequence, origin_year, kind, original_amount, remaining_amount,
          status, repay_by, applications_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.ship_id.as_str(),
            sequence,
            entry.origin_year,
            entry.kind.to_string(),
            entry.original_amount.to_string(),
            entry.remaining_amount.to_string(),
            entry.status.to_string(),
            entry.repay_by,
            serde_json::to_string(&entry.applications)?,
        ],
    )?;
    Ok(())
}

fn write_pool(tx: &Transaction<'_>, formation: &PoolFormation) -> PortResult<()> {
    let pool = &formation.pool;
    for ship_id in &pool.members {
        if let Some(pool_id) = find_membership(tx, ship_id, pool.year)? {
            return Err(PortError::MembershipConflict {
                ship_id: ship_id.clone(),
                year: pool.year,
                pool_id,
            });
        }
    }

    let exists: Option<String> = tx
        .query_row(
            "SELECT pool_id FROM pools WHERE pool_id = ?1",
            params![pool.pool_id],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(PortError::DuplicatePool(pool.pool_id.clone()));
    }

    tx.execute(
        "INSERT INTO pools (pool_id, year, members_json, aggregate_cb, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            pool.pool_id,
            pool.year,
            serde_json::to_string(&pool.members)?,
            pool.aggregate_adjusted_cb.to_string(),
            pool.created_at.to_rfc3339(),
        ],
    )?;

    for (position, allocation) in formation.allocations.iter().enumerate() {
        tx.execute(
            "INSERT INTO pool_allocations
             (pool_id, ship_id, year, position, pre_cb, post_cb, delta)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                allocation.pool_id,
                allocation.ship_id.as_str(),
                pool.year,
                position as i64,
                allocation.pre_cb.to_string(),
                allocation.post_cb.to_string(),
                allocation.delta.to_string(),
            ],
        )?;
    }
    Ok(())
}

// === Row decoding ===

struct RawRecord {
    ship_id: String,
    year: Year,
    fuel: String,
    quantity: String,
    emission_factor: String,
    lcv: Option<String>,
    renewable: bool,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ship_id: row.get(0)?,
            year: row.get(1)?,
            fuel: row.get(2)?,
            quantity: row.get(3)?,
            emission_factor: row.get(4)?,
            lcv: row.get(5)?,
            renewable: row.get(6)?,
        })
    }

    fn parse(self) -> PortResult<ConsumptionRecord> {
        const TABLE: &str = "consumption_records";
        Ok(ConsumptionRecord {
            ship_id: ship(TABLE, &self.ship_id)?,
            year: self.year,
            fuel: FuelType::from_str(&self.fuel).map_err(|e| corrupt(TABLE, e))?,
            quantity: decimal(TABLE, &self.quantity)?,
            emission_factor: decimal(TABLE, &self.emission_factor)?,
            lcv: self.lcv.map(|v| decimal(TABLE, &v)).transpose()?,
            renewable: self.renewable,
        })
    }
}

struct RawEntry {
    ship_id: String,
    sequence: i64,
    origin_year: Year,
    kind: String,
    original_amount: String,
    remaining_amount: String,
    status: String,
    repay_by: Option<Year>,
    applications_json: String,
}

impl RawEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ship_id: row.get(0)?,
            sequence: row.get(1)?,
            origin_year: row.get(2)?,
            kind: row.get(3)?,
            original_amount: row.get(4)?,
            remaining_amount: row.get(5)?,
            status: row.get(6)?,
            repay_by: row.get(7)?,
            applications_json: row.get(8)?,
        })
    }

    fn parse(self) -> PortResult<BankingEntry> {
        const TABLE: &str = "banking_entries";
        Ok(BankingEntry {
            ship_id: ship(TABLE, &self.ship_id)?,
            sequence: u64::try_from(self.sequence).map_err(|e| corrupt(TABLE, e))?,
            origin_year: self.origin_year,
            kind: EntryKind::from_str(&self.kind).map_err(|e| corrupt(TABLE, e))?,
            original_amount: amount(TABLE, &self.original_amount)?,
            remaining_amount: amount(TABLE, &self.remaining_amount)?,
            status: EntryStatus::from_str(&self.status).map_err(|e| corrupt(TABLE, e))?,
            repay_by: self.repay_by,
            applications: serde_json::from_str(&self.applications_json)?,
        })
    }
}

fn corrupt(table: &'static str, err: impl std::fmt::Display) -> PortError {
    PortError::Corrupt {
        table,
        reason: err.to_string(),
    }
}

fn decimal(table: &'static str, value: &str) -> PortResult<Decimal> {
    Decimal::from_str(value).map_err(|e| corrupt(table, e))
}

fn balance(table: &'static str, value: &str) -> PortResult<ComplianceBalance> {
    decimal(table, value).map(ComplianceBalance::new)
}

fn amount(table: &'static str, value: &str) -> PortResult<Amount> {
    Amount::new(decimal(table, value)?).map_err(|e| corrupt(table, e))
}

fn ship(table: &'static str, value: &str) -> PortResult<ShipId> {
    ShipId::from_str(value).map_err(|e| corrupt(table, e))
}
