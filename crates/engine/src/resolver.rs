//! Adjusted Compliance Balance
//!
//! For a ship-year Y:
//!
//! ```text
//! bankingAdjustment = covered(Y) + borrowed(Y) − bankedOut(Y) − repaid(Y)
//! adjustedCB        = rawCB + bankingAdjustment
//! pooledCB          = adjustedCB + poolDelta(Y)
//! ```
//!
//! - `covered(Y)`: earlier banked surplus drawn for Y's deficit
//! - `borrowed(Y)`: advance taken in Y
//! - `bankedOut(Y)`: Y's surplus moved into the bank
//! - `repaid(Y)`: Y's surplus spent repaying earlier advances
//! - `poolDelta(Y)`: what Y's pool moved to or from the ship
//!
//! Open banked surplus still eligible for Y is reported as
//! `carried_reserve` but is not part of Y's balance until drawn. Only
//! entries originating in Y or applied to Y move Y's figure, so a later
//! year's draw never changes it.
//!
//! A deficit year nets its own advance and pool receipts first, then draws
//! FIFO for what is still outstanding. Only the uncovered remainder is ever
//! drawn, so resolving a year twice consumes nothing the second time.

use fueleu_banking::{BankingError, BorrowingViolation, Draw, ShipLedger};
use fueleu_core::{Amount, ComplianceBalance, ShipId, Year};
use fueleu_intensity::ComplianceSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// Derived balance for a ship-year. Never authoritative: always
/// re-derivable from the snapshot and the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustedBalance {
    pub ship_id: ShipId,
    pub year: Year,
    pub raw_cb: ComplianceBalance,
    pub banking_adjustment: ComplianceBalance,
    /// Pre-pool figure; what a pool prices the ship at
    pub adjusted_cb: ComplianceBalance,
    pub pool_delta: ComplianceBalance,
    /// Final figure for the year
    pub pooled_cb: ComplianceBalance,

    pub covered: Amount,
    /// Informational, not included in `adjusted_cb`
    pub carried_reserve: Amount,
    pub borrowed: Amount,
    pub banked_out: Amount,
    pub repaid: Amount,
    /// Residual deficit after borrowing, pool receipts and FIFO coverage
    pub uncovered_gap: Amount,

    /// Draws made by this resolution
    pub drawn: Vec<Draw>,
    /// Entries expired by this resolution
    pub expired: Vec<u64>,
    pub overdue_borrowings: Vec<BorrowingViolation>,
}

impl AdjustedBalance {
    pub fn has_gap(&self) -> bool {
        !self.uncovered_gap.is_zero()
    }

    pub fn is_compliant(&self) -> bool {
        !self.pooled_cb.is_deficit() && self.overdue_borrowings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AdjustedBalanceResolver;

impl AdjustedBalanceResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the snapshot's year, drawing banked surplus for any
    /// outstanding deficit. Touched entries show up in
    /// `ledger.changed_entries()`.
    pub fn resolve(
        &self,
        ledger: &mut ShipLedger,
        snapshot: &ComplianceSnapshot,
    ) -> EngineResult<AdjustedBalance> {
        if ledger.ship_id() != &snapshot.ship_id {
            return Err(EngineError::Banking(BankingError::ShipMismatch {
                expected: ledger.ship_id().clone(),
                actual: snapshot.ship_id.clone(),
            }));
        }

        let year = snapshot.year;
        let mut drawn = Vec::new();
        let mut expired = Vec::new();

        if snapshot.is_deficit() {
            let outstanding = snapshot
                .raw_cb
                .deficit()
                .saturating_sub(&ledger.borrowed_in(year))
                .saturating_sub(&ledger.pool_received(year))
                .saturating_sub(&ledger.covered_in(year));

            if !outstanding.is_zero() {
                let outcome = ledger.consume_for_deficit(year, outstanding)?;
                drawn = outcome.drawn;
                expired = outcome.expired;
            }
        }

        let balance = compose(ledger, snapshot, drawn, expired);
        if balance.has_gap() {
            warn!(
                ship = %balance.ship_id,
                year,
                gap = %balance.uncovered_gap,
                "Uncovered compliance gap"
            );
        }
        debug!(
            ship = %balance.ship_id,
            year,
            raw_cb = %balance.raw_cb,
            adjusted_cb = %balance.adjusted_cb,
            "Resolved adjusted balance"
        );
        Ok(balance)
    }

    /// Same computation on a copy of the ledger; nothing is mutated
    pub fn preview(
        &self,
        ledger: &ShipLedger,
        snapshot: &ComplianceSnapshot,
    ) -> EngineResult<AdjustedBalance> {
        let mut scratch = ledger.clone();
        self.resolve(&mut scratch, snapshot)
    }
}

fn compose(
    ledger: &ShipLedger,
    snapshot: &ComplianceSnapshot,
    drawn: Vec<Draw>,
    expired: Vec<u64>,
) -> AdjustedBalance {
    let year = snapshot.year;
    let covered = ledger.covered_in(year);
    let carried_reserve = ledger.eligible_reserve(year);
    let borrowed = ledger.borrowed_in(year);
    let banked_out = ledger.banked_from(year);
    let repaid = ledger.repaid_in(year);
    let pool_delta = ledger.pool_delta(year);

    let banking_adjustment = ComplianceBalance::ZERO
        .credit(covered)
        .credit(borrowed)
        .debit(banked_out)
        .debit(repaid);
    let adjusted_cb = snapshot.raw_cb + banking_adjustment;

    let uncovered_gap = snapshot
        .raw_cb
        .deficit()
        .saturating_sub(&borrowed)
        .saturating_sub(&pool_delta.surplus())
        .saturating_sub(&covered);

    AdjustedBalance {
        ship_id: snapshot.ship_id.clone(),
        year,
        raw_cb: snapshot.raw_cb,
        banking_adjustment,
        adjusted_cb,
        pool_delta,
        pooled_cb: adjusted_cb + pool_delta,
        covered,
        carried_reserve,
        borrowed,
        banked_out,
        repaid,
        uncovered_gap,
        drawn,
        expired,
        overdue_borrowings: ledger.overdue_borrowings(year),
    }
}
