//! Per-ship banking ledger
//!
//! Append-only ordered sequence of `BankingEntry` records for one ship.
//! Callers must serialize operations on the same ship (see the engine's
//! lock table): draws and expiries are not safely interleavable.
//!
//! Pool outcomes are not banking entries. The caller attaches a ship's
//! pool delta for a year with `with_pool_delta`; the year's surplus and
//! deficit are then read post-pool, so pooled value cannot also be banked,
//! repaid with, borrowed against or drawn for.

use std::collections::{BTreeMap, BTreeSet};

use fueleu_core::{Amount, ComplianceBalance, ShipId, Year};
use fueleu_intensity::ComplianceSnapshot;
use tracing::{debug, info, warn};

use crate::config::BankingConfig;
use crate::entry::BankingEntry;
use crate::error::{BankingError, BankingResult};
use crate::outcome::{BorrowingViolation, ConsumptionOutcome, Draw, RepaymentOutcome};

/// Banking ledger for a single ship
#[derive(Debug, Clone)]
pub struct ShipLedger {
    ship_id: ShipId,
    config: BankingConfig,
    /// Kept sorted by sequence
    entries: Vec<BankingEntry>,
    /// Sequences created or mutated since load
    changed: BTreeSet<u64>,
    pool_deltas: BTreeMap<Year, ComplianceBalance>,
}

impl ShipLedger {
    /// Create an empty ledger
    pub fn new(ship_id: ShipId, config: BankingConfig) -> Self {
        Self {
            ship_id,
            config,
            entries: Vec::new(),
            changed: BTreeSet::new(),
            pool_deltas: BTreeMap::new(),
        }
    }

    /// Rebuild a ledger from stored entries
    pub fn from_entries(
        ship_id: ShipId,
        config: BankingConfig,
        mut entries: Vec<BankingEntry>,
    ) -> BankingResult<Self> {
        entries.sort_by_key(|e| e.sequence);

        for (i, entry) in entries.iter().enumerate() {
            if entry.ship_id != ship_id {
                return Err(BankingError::ShipMismatch {
                    expected: ship_id,
                    actual: entry.ship_id.clone(),
                });
            }
            if i > 0 && entries[i - 1].sequence == entry.sequence {
                return Err(BankingError::CorruptEntry {
                    sequence: entry.sequence,
                    reason: "duplicate sequence",
                });
            }
            if entry.remaining_amount > entry.original_amount {
                return Err(BankingError::CorruptEntry {
                    sequence: entry.sequence,
                    reason: "remaining exceeds original",
                });
            }
        }

        Ok(Self {
            ship_id,
            config,
            entries,
            changed: BTreeSet::new(),
            pool_deltas: BTreeMap::new(),
        })
    }

    /// Attach the ship's pool allocation delta (post − pre) for `year`
    pub fn with_pool_delta(mut self, year: Year, delta: ComplianceBalance) -> Self {
        self.pool_deltas.insert(year, delta);
        self
    }

    /// Signed pool delta for `year`; zero outside any pool
    pub fn pool_delta(&self, year: Year) -> ComplianceBalance {
        self.pool_deltas.get(&year).copied().unwrap_or_default()
    }

    /// Value received from pool donors in `year`
    pub fn pool_received(&self, year: Year) -> Amount {
        self.pool_delta(year).surplus()
    }

    pub fn ship_id(&self) -> &ShipId {
        &self.ship_id
    }

    pub fn config(&self) -> &BankingConfig {
        &self.config
    }

    /// All entries, ordered by sequence
    pub fn entries(&self) -> &[BankingEntry] {
        &self.entries
    }

    pub fn entry(&self, sequence: u64) -> Option<&BankingEntry> {
        self.entries.iter().find(|e| e.sequence == sequence)
    }

    pub fn open_entries(&self) -> impl Iterator<Item = &BankingEntry> {
        self.entries.iter().filter(|e| e.is_open())
    }

    /// Entries created or mutated since the ledger was loaded
    pub fn changed_entries(&self) -> Vec<BankingEntry> {
        self.entries
            .iter()
            .filter(|e| self.changed.contains(&e.sequence))
            .cloned()
            .collect()
    }

    fn next_sequence(&self) -> u64 {
        self.entries.last().map_or(1, |e| e.sequence + 1)
    }

    // === Per-year aggregates ===

    /// Surplus of `year` moved into the bank
    pub fn banked_from(&self, year: Year) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.is_banked() && e.origin_year == year)
            .map(|e| e.original_amount)
            .sum()
    }

    /// Advance taken in `year`
    pub fn borrowed_in(&self, year: Year) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.is_borrowed() && e.origin_year == year)
            .map(|e| e.original_amount)
            .sum()
    }

    /// Banked surplus drawn to cover the deficit of `year`
    pub fn covered_in(&self, year: Year) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.is_banked())
            .map(|e| e.applied_in(year))
            .sum()
    }

    /// Surplus of `year` used to repay earlier advances
    pub fn repaid_in(&self, year: Year) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.is_borrowed())
            .map(|e| e.applied_in(year))
            .sum()
    }

    /// The snapshot's raw CB after its pool delta
    fn pooled_position(&self, snapshot: &ComplianceSnapshot) -> ComplianceBalance {
        snapshot.raw_cb + self.pool_delta(snapshot.year)
    }

    /// Surplus of the snapshot's year left after pool donations, banking
    /// and repayment
    pub fn unallocated_surplus(&self, snapshot: &ComplianceSnapshot) -> Amount {
        self.pooled_position(snapshot)
            .surplus()
            .saturating_sub(&self.banked_from(snapshot.year))
            .saturating_sub(&self.repaid_in(snapshot.year))
    }

    fn is_eligible_for(&self, entry: &BankingEntry, target_year: Year) -> bool {
        entry.is_open()
            && entry.is_banked()
            && entry.origin_year < target_year
            && !self.is_past_window(entry, target_year)
    }

    fn is_past_window(&self, entry: &BankingEntry, target_year: Year) -> bool {
        let window = i64::from(self.config.banking_window_years);
        i64::from(target_year) > i64::from(entry.origin_year) + window
    }

    /// Open banked surplus usable for `target_year`. Read-only: entries past
    /// their window are skipped here, not expired.
    pub fn eligible_reserve(&self, target_year: Year) -> Amount {
        self.entries
            .iter()
            .filter(|e| self.is_eligible_for(e, target_year))
            .map(|e| e.remaining_amount)
            .sum()
    }

    // === Operations ===

    /// Bank part of a surplus year.
    ///
    /// Requires `amount > 0` and that the snapshot's surplus not yet banked
    /// (or used for repayment) covers it.
    pub fn bank_surplus(
        &mut self,
        snapshot: &ComplianceSnapshot,
        amount: Amount,
    ) -> BankingResult<&BankingEntry> {
        self.check_snapshot(snapshot)?;
        if amount.is_zero() {
            return Err(BankingError::NonPositiveAmount);
        }

        let available = self.unallocated_surplus(snapshot);
        if amount > available {
            return Err(BankingError::InsufficientSurplus {
                ship_id: self.ship_id.clone(),
                year: snapshot.year,
                available,
                requested: amount,
            });
        }

        let sequence = self.next_sequence();
        let entry = BankingEntry::banked(self.ship_id.clone(), sequence, snapshot.year, amount);
        info!(
            ship = %self.ship_id,
            year = snapshot.year,
            sequence,
            amount = %amount,
            "Banked surplus"
        );
        Ok(self.push(entry))
    }

    /// Cover a deficit in `target_year` from earlier banked surplus.
    ///
    /// Open banked entries past their window are expired first; the rest
    /// are drawn oldest `origin_year` first, ties by `sequence`. Returns what
    /// was actually covered, which may fall short of `deficit`.
    pub fn consume_for_deficit(
        &mut self,
        target_year: Year,
        deficit: Amount,
    ) -> BankingResult<ConsumptionOutcome> {
        if deficit.is_zero() {
            return Err(BankingError::NonPositiveAmount);
        }

        let expired = self.expire_past_window(target_year);

        let mut candidates: Vec<usize> = (0..self.entries.len())
            .filter(|&i| self.is_eligible_for(&self.entries[i], target_year))
            .collect();
        candidates.sort_by_key(|&i| (self.entries[i].origin_year, self.entries[i].sequence));

        let mut outstanding = deficit;
        let mut drawn = Vec::new();
        for i in candidates {
            if outstanding.is_zero() {
                break;
            }
            let entry = &mut self.entries[i];
            let taken = entry.draw(target_year, outstanding);
            if taken.is_zero() {
                continue;
            }
            outstanding = outstanding.saturating_sub(&taken);
            drawn.push(Draw {
                sequence: entry.sequence,
                origin_year: entry.origin_year,
                amount: taken,
            });
            self.changed.insert(entry.sequence);
        }

        let covered = deficit.saturating_sub(&outstanding);
        if outstanding.is_zero() {
            debug!(ship = %self.ship_id, target_year, covered = %covered, "Deficit covered");
        } else {
            warn!(
                ship = %self.ship_id,
                target_year,
                covered = %covered,
                uncovered = %outstanding,
                "Banked surplus insufficient for deficit"
            );
        }

        Ok(ConsumptionOutcome {
            target_year,
            requested: deficit,
            covered,
            uncovered: outstanding,
            drawn,
            expired,
        })
    }

    /// Borrow an advance against expected next-year surplus.
    ///
    /// Requires a deficit year, `amount` within the deficit left after pool
    /// receipts and earlier coverage, within
    /// `borrowing_cap × expected_next_year_surplus`, one borrowing per year
    /// and, unless configured otherwise, none in the previous year.
    pub fn borrow(
        &mut self,
        snapshot: &ComplianceSnapshot,
        amount: Amount,
        expected_next_year_surplus: Amount,
    ) -> BankingResult<&BankingEntry> {
        self.check_snapshot(snapshot)?;
        if amount.is_zero() {
            return Err(BankingError::NonPositiveAmount);
        }

        let year = snapshot.year;
        let position = self.pooled_position(snapshot);
        if !position.is_deficit() {
            return Err(BankingError::NotInDeficit {
                ship_id: self.ship_id.clone(),
                year,
                balance: position,
            });
        }

        let deficit = position.deficit().saturating_sub(&self.covered_in(year));
        if amount > deficit {
            return Err(BankingError::ExceedsDeficit {
                year,
                deficit,
                requested: amount,
            });
        }

        let cap = Amount::new_unchecked(
            expected_next_year_surplus.value() * self.config.borrowing_cap,
        );
        if amount > cap {
            return Err(BankingError::ExceedsBorrowingCap {
                requested: amount,
                cap,
            });
        }

        if !self.borrowed_in(year).is_zero() {
            return Err(BankingError::AlreadyBorrowed {
                ship_id: self.ship_id.clone(),
                year,
            });
        }
        if !self.config.allow_consecutive_borrowing && !self.borrowed_in(year - 1).is_zero() {
            return Err(BankingError::ConsecutiveBorrowing {
                ship_id: self.ship_id.clone(),
                previous_year: year - 1,
            });
        }

        let repay_by = year.saturating_add_unsigned(self.config.repayment_deadline_years);
        let sequence = self.next_sequence();
        let entry = BankingEntry::borrowed(self.ship_id.clone(), sequence, year, amount, repay_by);
        info!(
            ship = %self.ship_id,
            year,
            sequence,
            amount = %amount,
            repay_by,
            "Borrowed advance"
        );
        Ok(self.push(entry))
    }

    /// Repay open advances from earlier years out of the snapshot's
    /// unallocated surplus, oldest first.
    pub fn repay_borrowings(
        &mut self,
        snapshot: &ComplianceSnapshot,
    ) -> BankingResult<RepaymentOutcome> {
        self.check_snapshot(snapshot)?;

        let year = snapshot.year;
        let available = self.unallocated_surplus(snapshot);

        let mut candidates: Vec<usize> = (0..self.entries.len())
            .filter(|&i| {
                let e = &self.entries[i];
                e.is_open() && e.is_borrowed() && e.origin_year < year
            })
            .collect();
        candidates.sort_by_key(|&i| (self.entries[i].origin_year, self.entries[i].sequence));

        let mut left = available;
        let mut repayments = Vec::new();
        for i in candidates {
            if left.is_zero() {
                break;
            }
            let entry = &mut self.entries[i];
            let taken = entry.draw(year, left);
            if taken.is_zero() {
                continue;
            }
            left = left.saturating_sub(&taken);
            repayments.push(Draw {
                sequence: entry.sequence,
                origin_year: entry.origin_year,
                amount: taken,
            });
            self.changed.insert(entry.sequence);
        }

        let repaid = available.saturating_sub(&left);
        if !repaid.is_zero() {
            info!(ship = %self.ship_id, year, repaid = %repaid, "Repaid borrowed advances");
        }

        Ok(RepaymentOutcome {
            year,
            available,
            repaid,
            repayments,
        })
    }

    /// Open advances whose deadline passed before `as_of_year`
    pub fn overdue_borrowings(&self, as_of_year: Year) -> Vec<BorrowingViolation> {
        self.entries
            .iter()
            .filter(|e| e.is_open() && e.is_borrowed())
            .filter_map(|e| {
                let repay_by = e.repay_by?;
                (repay_by < as_of_year).then(|| BorrowingViolation {
                    ship_id: e.ship_id.clone(),
                    sequence: e.sequence,
                    origin_year: e.origin_year,
                    repay_by,
                    outstanding: e.remaining_amount,
                })
            })
            .collect()
    }

    fn expire_past_window(&mut self, target_year: Year) -> Vec<u64> {
        let past: Vec<usize> = (0..self.entries.len())
            .filter(|&i| {
                let e = &self.entries[i];
                e.is_open() && e.is_banked() && self.is_past_window(e, target_year)
            })
            .collect();

        let mut expired = Vec::with_capacity(past.len());
        for i in past {
            let entry = &mut self.entries[i];
            if entry.expire() {
                warn!(
                    ship = %self.ship_id,
                    sequence = entry.sequence,
                    origin_year = entry.origin_year,
                    forfeited = %entry.remaining_amount,
                    "Banked surplus expired"
                );
                expired.push(entry.sequence);
                self.changed.insert(entry.sequence);
            }
        }
        expired
    }

    fn check_snapshot(&self, snapshot: &ComplianceSnapshot) -> BankingResult<()> {
        if snapshot.ship_id != self.ship_id {
            return Err(BankingError::ShipMismatch {
                expected: self.ship_id.clone(),
                actual: snapshot.ship_id.clone(),
            });
        }
        Ok(())
    }

    fn push(&mut self, entry: BankingEntry) -> &BankingEntry {
        self.changed.insert(entry.sequence);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }
}
