//! Compliance Engine - Main orchestrator
//!
//! Loads state through the port, runs one component operation under the
//! relevant ship locks, commits the touched state as a single unit of
//! work, then journals what happened.

use std::collections::HashMap;
use std::sync::Mutex;

use fueleu_banking::{BankingEntry, BorrowingViolation, RepaymentOutcome, ShipLedger};
use fueleu_core::{Amount, ComplianceBalance, ShipId, Year};
use fueleu_intensity::{ComplianceSnapshot, ConsumptionRecord, IntensityCalculator};
use fueleu_pooling::{PoolAllocator, PoolFormation};
use fueleu_store::{CompliancePort, PortError, UnitOfWork};
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::event::EngineEvent;
use crate::journal::AuditJournal;
use crate::locks::ShipLocks;
use crate::resolver::{AdjustedBalance, AdjustedBalanceResolver};

/// Main Compliance Engine
///
/// Safe to share across threads: per-ship operations are serialized by
/// `ShipLocks`, pool formation holds every member's lock.
pub struct ComplianceEngine<P: CompliancePort> {
    config: EngineConfig,
    port: P,
    calculator: IntensityCalculator,
    resolver: AdjustedBalanceResolver,
    allocator: PoolAllocator,
    locks: ShipLocks,
    journal: Mutex<AuditJournal>,
}

impl<P: CompliancePort> ComplianceEngine<P> {
    /// Create an engine; the journal follows `config.journal_path`
    pub fn new(config: EngineConfig, port: P) -> EngineResult<Self> {
        let journal = match &config.journal_path {
            Some(path) => AuditJournal::open(path)?,
            None => AuditJournal::in_memory(),
        };
        Self::with_journal(config, port, journal)
    }

    pub fn with_journal(config: EngineConfig, port: P, journal: AuditJournal) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            calculator: IntensityCalculator::new(config.intensity.clone()),
            resolver: AdjustedBalanceResolver::new(),
            allocator: PoolAllocator::new(config.pooling.clone()),
            locks: ShipLocks::new(),
            journal: Mutex::new(journal),
            config,
            port,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    // === Inputs ===

    /// Store a consumption record (input data, never mutated afterwards)
    pub fn record_consumption(&self, record: &ConsumptionRecord) -> EngineResult<()> {
        self.port.save_consumption_record(record)?;
        Ok(())
    }

    /// Store a target intensity that overrides the configured schedule
    pub fn set_target_intensity(&self, year: Year, intensity: Decimal) -> EngineResult<()> {
        if intensity <= Decimal::ZERO {
            return Err(fueleu_intensity::IntensityError::InvalidTarget(intensity).into());
        }
        self.port.save_target_intensity(year, intensity)?;
        Ok(())
    }

    /// Stored target for `year`, else the configured schedule
    pub fn target_intensity(&self, year: Year) -> EngineResult<Decimal> {
        match self.port.load_target_intensity(year)? {
            Some(target) => Ok(target),
            None => Ok(self.config.targets.target_for(year)?),
        }
    }

    // === Operations ===

    /// Compute and store the snapshot for a ship-year.
    ///
    /// An existing identical snapshot is returned unchanged; changed inputs
    /// for a finalized year fail with a conflict.
    pub fn compute_snapshot(&self, ship_id: &ShipId, year: Year) -> EngineResult<ComplianceSnapshot> {
        self.locks.with_ship(ship_id, || {
            let records = self.port.load_consumption_records(ship_id, year)?;
            let target = self.target_intensity(year)?;
            let snapshot = self
                .calculator
                .compute_snapshot(ship_id, year, &records, target)?;

            if self.port.load_compliance_snapshot(ship_id, year)?.as_ref() == Some(&snapshot) {
                return Ok(snapshot);
            }

            self.port
                .commit(UnitOfWork::new().with_snapshot(snapshot.clone()))?;
            info!(ship = %ship_id, year, raw_cb = %snapshot.raw_cb, "Snapshot stored");
            self.record(vec![EngineEvent::snapshot_computed(
                ship_id.clone(),
                year,
                snapshot.raw_cb,
            )]);
            Ok(snapshot)
        })
    }

    /// Bank part of a surplus year
    pub fn bank_surplus(
        &self,
        ship_id: &ShipId,
        year: Year,
        amount: Amount,
    ) -> EngineResult<BankingEntry> {
        self.locks.with_ship(ship_id, || {
            let snapshot = self.snapshot(ship_id, year)?;
            let mut ledger = self.ledger_for(ship_id, year)?;
            let entry = ledger.bank_surplus(&snapshot, amount)?.clone();

            self.port
                .commit(UnitOfWork::new().with_banking_entries(ledger.changed_entries()))?;
            self.record(vec![EngineEvent::surplus_banked(
                ship_id.clone(),
                year,
                entry.sequence,
                amount,
            )]);
            Ok(entry)
        })
    }

    /// Borrow an advance against expected next-year surplus
    pub fn borrow(
        &self,
        ship_id: &ShipId,
        year: Year,
        amount: Amount,
        expected_next_year_surplus: Amount,
    ) -> EngineResult<BankingEntry> {
        self.locks.with_ship(ship_id, || {
            let snapshot = self.snapshot(ship_id, year)?;
            let mut ledger = self.ledger_for(ship_id, year)?;
            let entry = ledger
                .borrow(&snapshot, amount, expected_next_year_surplus)?
                .clone();

            self.port
                .commit(UnitOfWork::new().with_banking_entries(ledger.changed_entries()))?;
            if let Some(repay_by) = entry.repay_by {
                self.record(vec![EngineEvent::borrowing_recorded(
                    ship_id.clone(),
                    year,
                    entry.sequence,
                    amount,
                    repay_by,
                )]);
            }
            Ok(entry)
        })
    }

    /// Repay earlier advances from a surplus year
    pub fn repay_borrowings(&self, ship_id: &ShipId, year: Year) -> EngineResult<RepaymentOutcome> {
        self.locks.with_ship(ship_id, || {
            let snapshot = self.snapshot(ship_id, year)?;
            let mut ledger = self.ledger_for(ship_id, year)?;
            let outcome = ledger.repay_borrowings(&snapshot)?;

            if outcome.repaid.is_zero() {
                return Ok(outcome);
            }
            self.port
                .commit(UnitOfWork::new().with_banking_entries(ledger.changed_entries()))?;
            self.record(vec![EngineEvent::borrowing_repaid(
                ship_id.clone(),
                year,
                outcome.repaid,
                outcome.repayments.clone(),
            )]);
            Ok(outcome)
        })
    }

    /// Resolve the Adjusted CB, drawing banked surplus for a deficit year
    pub fn resolve_adjusted_balance(
        &self,
        ship_id: &ShipId,
        year: Year,
    ) -> EngineResult<AdjustedBalance> {
        self.locks.with_ship(ship_id, || {
            let snapshot = self.snapshot(ship_id, year)?;
            let mut ledger = self.ledger_for(ship_id, year)?;
            let balance = self.resolver.resolve(&mut ledger, &snapshot)?;

            let changed = ledger.changed_entries();
            if changed.is_empty() {
                return Ok(balance);
            }
            self.port
                .commit(UnitOfWork::new().with_banking_entries(changed))?;

            let mut events = Vec::new();
            if !balance.expired.is_empty() {
                events.push(EngineEvent::entries_expired(
                    ship_id.clone(),
                    year,
                    balance.expired.clone(),
                ));
            }
            if !balance.drawn.is_empty() {
                let covered: Amount = balance.drawn.iter().map(|d| d.amount).sum();
                events.push(EngineEvent::deficit_covered(
                    ship_id.clone(),
                    year,
                    covered,
                    balance.uncovered_gap,
                    balance.drawn.clone(),
                ));
            }
            self.record(events);
            Ok(balance)
        })
    }

    /// Adjusted CB without touching stored state
    pub fn preview_adjusted_balance(
        &self,
        ship_id: &ShipId,
        year: Year,
    ) -> EngineResult<AdjustedBalance> {
        self.locks
            .with_ship(ship_id, || self.preview_unlocked(ship_id, year))
    }

    /// Form a pool from the members' Adjusted CB for `year`.
    ///
    /// Members are priced with a preview of their Adjusted CB; a member
    /// with no snapshot for the year is reported as a missing balance.
    /// Banked surplus carried from earlier years is not poolable until it
    /// is drawn for a deficit. The committed deltas are read back by every
    /// later banking or resolution call for the same ship-year.
    pub fn form_pool(&self, year: Year, members: &[ShipId]) -> EngineResult<PoolFormation> {
        self.locks.with_ships(members, || {
            let mut balances: HashMap<ShipId, ComplianceBalance> = HashMap::new();
            let mut memberships: HashMap<ShipId, String> = HashMap::new();

            for ship_id in members {
                if balances.contains_key(ship_id) {
                    continue;
                }
                if let Some(pool_id) = self.port.load_pool_membership(ship_id, year)? {
                    memberships.insert(ship_id.clone(), pool_id);
                }
                match self.preview_unlocked(ship_id, year) {
                    Ok(balance) => {
                        balances.insert(ship_id.clone(), balance.adjusted_cb);
                    }
                    Err(EngineError::SnapshotMissing { .. }) => {}
                    Err(e) => return Err(e),
                }
            }

            let formation = self
                .allocator
                .form_pool(year, members, &balances, &memberships)?;

            self.port
                .commit(UnitOfWork::new().with_pool(formation.clone()))?;
            info!(
                pool_id = %formation.pool.pool_id,
                year,
                aggregate = %formation.pool.aggregate_adjusted_cb,
                "Pool formed"
            );
            self.record(vec![EngineEvent::pool_formed(
                formation.pool.pool_id.clone(),
                year,
                formation.pool.members.clone(),
                formation.pool.aggregate_adjusted_cb,
            )]);
            Ok(formation)
        })
    }

    // === Queries ===

    pub fn snapshot_for(&self, ship_id: &ShipId, year: Year) -> EngineResult<Option<ComplianceSnapshot>> {
        Ok(self.port.load_compliance_snapshot(ship_id, year)?)
    }

    /// Every banking entry of a ship, ordered by sequence
    pub fn banking_entries(&self, ship_id: &ShipId) -> EngineResult<Vec<BankingEntry>> {
        self.locks
            .with_ship(ship_id, || Ok(self.port.load_banking_entries(ship_id)?))
    }

    /// Open advances past their repayment deadline as of `as_of_year`
    pub fn overdue_borrowings(
        &self,
        ship_id: &ShipId,
        as_of_year: Year,
    ) -> EngineResult<Vec<BorrowingViolation>> {
        self.locks.with_ship(ship_id, || {
            Ok(self.ledger(ship_id)?.overdue_borrowings(as_of_year))
        })
    }

    pub fn pool(&self, pool_id: &str) -> EngineResult<Option<PoolFormation>> {
        Ok(self.port.load_pool(pool_id)?)
    }

    /// Verify the audit journal's hash chain; returns the record count
    pub fn verify_journal(&self) -> EngineResult<usize> {
        let journal = self
            .journal
            .lock()
            .map_err(|_| EngineError::LockPoisoned("journal".to_string()))?;
        Ok(journal.verify()?)
    }

    /// Every journaled event, oldest first
    pub fn journal_events(&self) -> EngineResult<Vec<EngineEvent>> {
        let journal = self
            .journal
            .lock()
            .map_err(|_| EngineError::LockPoisoned("journal".to_string()))?;
        Ok(journal.read_all()?.into_iter().map(|r| r.event).collect())
    }

    // === Helpers ===

    fn snapshot(&self, ship_id: &ShipId, year: Year) -> EngineResult<ComplianceSnapshot> {
        self.port
            .load_compliance_snapshot(ship_id, year)?
            .ok_or_else(|| EngineError::SnapshotMissing {
                ship_id: ship_id.clone(),
                year,
            })
    }

    fn ledger(&self, ship_id: &ShipId) -> EngineResult<ShipLedger> {
        let entries = self.port.load_banking_entries(ship_id)?;
        Ok(ShipLedger::from_entries(
            ship_id.clone(),
            self.config.banking.clone(),
            entries,
        )?)
    }

    /// Ledger with the ship's pool delta for `year` attached
    fn ledger_for(&self, ship_id: &ShipId, year: Year) -> EngineResult<ShipLedger> {
        let ledger = self.ledger(ship_id)?;
        Ok(match self.pool_delta(ship_id, year)? {
            Some(delta) => ledger.with_pool_delta(year, delta),
            None => ledger,
        })
    }

    fn pool_delta(&self, ship_id: &ShipId, year: Year) -> EngineResult<Option<ComplianceBalance>> {
        let Some(pool_id) = self.port.load_pool_membership(ship_id, year)? else {
            return Ok(None);
        };
        let allocation = self
            .port
            .load_pool(&pool_id)?
            .and_then(|formation| formation.allocation_for(ship_id).map(|a| a.delta));
        match allocation {
            Some(delta) => Ok(Some(delta)),
            None => Err(PortError::Corrupt {
                table: "pool_allocations",
                reason: format!("{ship_id} is a member of {pool_id} without an allocation"),
            }
            .into()),
        }
    }

    /// Caller holds the ship's lock
    fn preview_unlocked(&self, ship_id: &ShipId, year: Year) -> EngineResult<AdjustedBalance> {
        let snapshot = self.snapshot(ship_id, year)?;
        let ledger = self.ledger_for(ship_id, year)?;
        self.resolver.preview(&ledger, &snapshot)
    }

    /// Journal events for a committed unit of work. The commit already
    /// happened, so a journal failure is logged rather than returned.
    fn record(&self, events: Vec<EngineEvent>) {
        let mut journal = match self.journal.lock() {
            Ok(journal) => journal,
            Err(_) => {
                error!("Audit journal lock poisoned; events dropped");
                return;
            }
        };
        for event in events {
            if let Err(e) = journal.append(event) {
                error!(error = %e, "Failed to append audit event");
            }
        }
    }
}
