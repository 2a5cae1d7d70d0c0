//! FuelEU Banking Ledger (Article 20)
//!
//! Per-ship, multi-year store of banking entries:
//! - banked surplus, carried forward to offset later deficits
//! - borrowed deficit, an advance repaid from later surplus
//!
//! The ledger is an explicit value addressed by ship: it is built from the
//! entries the persistence port returns, mutated by one operation, and the
//! touched entries are handed back for a single commit.
//!
//! ## FIFO rule
//!
//! ```text
//! open banked entries ──expiry check──► eligible ──sort (origin_year, sequence)──► draw
//! ```
//!
//! Expiry precedes selection; ties on `origin_year` fall back to creation
//! `sequence`.

pub mod config;
pub mod entry;
pub mod error;
pub mod ledger;
pub mod outcome;

pub use config::BankingConfig;
pub use entry::{Application, BankingEntry, EntryKind, EntryStatus};
pub use error::{BankingError, BankingResult};
pub use ledger::ShipLedger;
pub use outcome::{BorrowingViolation, ConsumptionOutcome, Draw, RepaymentOutcome};
