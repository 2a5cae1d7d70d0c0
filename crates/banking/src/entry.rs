//! Banking entries
//!
//! An entry is created when a ship banks surplus or borrows against a
//! deficit. Afterwards it only changes by FIFO draws (remaining amount
//! decreases monotonically) or by expiry, and never reopens.

use fueleu_core::{Amount, ShipId, Year};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// What the entry represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryKind {
    /// Surplus carried forward
    BankedSurplus,
    /// Advance against future surplus, must be repaid
    BorrowedDeficit,
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryStatus {
    Open,
    /// Remaining amount reached zero
    Consumed,
    /// Banked surplus past its eligibility window
    Expired,
}

/// One draw against an entry, attributed to the year it served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub year: Year,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankingEntry {
    pub ship_id: ShipId,
    /// Per-ship creation order, FIFO tie-break within an origin year
    pub sequence: u64,
    pub origin_year: Year,
    pub kind: EntryKind,
    pub original_amount: Amount,
    pub remaining_amount: Amount,
    pub status: EntryStatus,
    /// Deadline year for borrowed entries
    pub repay_by: Option<Year>,
    /// Draws in application order
    #[serde(default)]
    pub applications: Vec<Application>,
}

impl BankingEntry {
    /// New open banked-surplus entry
    pub fn banked(ship_id: ShipId, sequence: u64, origin_year: Year, amount: Amount) -> Self {
        Self {
            ship_id,
            sequence,
            origin_year,
            kind: EntryKind::BankedSurplus,
            original_amount: amount,
            remaining_amount: amount,
            status: EntryStatus::Open,
            repay_by: None,
            applications: Vec::new(),
        }
    }

    /// New open borrowed-deficit entry
    pub fn borrowed(
        ship_id: ShipId,
        sequence: u64,
        origin_year: Year,
        amount: Amount,
        repay_by: Year,
    ) -> Self {
        Self {
            ship_id,
            sequence,
            origin_year,
            kind: EntryKind::BorrowedDeficit,
            original_amount: amount,
            remaining_amount: amount,
            status: EntryStatus::Open,
            repay_by: Some(repay_by),
            applications: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == EntryStatus::Open
    }

    pub fn is_banked(&self) -> bool {
        self.kind == EntryKind::BankedSurplus
    }

    pub fn is_borrowed(&self) -> bool {
        self.kind == EntryKind::BorrowedDeficit
    }

    /// Total drawn from this entry on behalf of `year`
    pub fn applied_in(&self, year: Year) -> Amount {
        self.applications
            .iter()
            .filter(|a| a.year == year)
            .map(|a| a.amount)
            .sum()
    }

    /// Draw up to `wanted` from the remaining amount on behalf of `year`.
    ///
    /// Returns what was actually drawn. The entry becomes `Consumed` when
    /// nothing remains. Closed entries yield zero.
    pub(crate) fn draw(&mut self, year: Year, wanted: Amount) -> Amount {
        if !self.is_open() || wanted.is_zero() {
            return Amount::ZERO;
        }

        let taken = wanted.min(self.remaining_amount);
        self.remaining_amount = self.remaining_amount.saturating_sub(&taken);
        self.applications.push(Application {
            year,
            amount: taken,
        });

        if self.remaining_amount.is_zero() {
            self.status = EntryStatus::Consumed;
        }
        taken
    }

    /// Mark an open entry expired. Returns false if it was already closed.
    pub(crate) fn expire(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.status = EntryStatus::Expired;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn amount(v: rust_decimal::Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    fn entry() -> BankingEntry {
        BankingEntry::banked("A".parse().unwrap(), 1, 2025, amount(dec!(80)))
    }

    #[test]
    fn test_partial_draw_keeps_entry_open() {
        let mut e = entry();
        let taken = e.draw(2027, amount(dec!(50)));

        assert_eq!(taken, amount(dec!(50)));
        assert_eq!(e.remaining_amount, amount(dec!(30)));
        assert_eq!(e.status, EntryStatus::Open);
        assert_eq!(e.applied_in(2027), amount(dec!(50)));
        assert_eq!(e.applied_in(2026), Amount::ZERO);
    }

    #[test]
    fn test_full_draw_consumes_entry() {
        let mut e = entry();
        let taken = e.draw(2026, amount(dec!(100)));

        assert_eq!(taken, amount(dec!(80)));
        assert!(e.remaining_amount.is_zero());
        assert_eq!(e.status, EntryStatus::Consumed);

        // Never resurrected
        assert_eq!(e.draw(2026, amount(dec!(1))), Amount::ZERO);
        assert!(!e.expire());
        assert_eq!(e.status, EntryStatus::Consumed);
    }

    #[test]
    fn test_expired_entry_yields_nothing() {
        let mut e = entry();
        assert!(e.expire());
        assert_eq!(e.draw(2030, amount(dec!(10))), Amount::ZERO);
        assert_eq!(e.remaining_amount, amount(dec!(80)));
    }

    #[test]
    fn test_kind_and_status_strings() {
        assert_eq!(EntryKind::BankedSurplus.to_string(), "banked_surplus");
        assert_eq!(
            EntryKind::from_str("borrowed_deficit").unwrap(),
            EntryKind::BorrowedDeficit
        );
        assert_eq!(EntryStatus::from_str("expired").unwrap(), EntryStatus::Expired);
    }
}
