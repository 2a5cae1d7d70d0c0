//! FuelEU Compliance Engine
//!
//! Orchestrates the calculators behind a single persistence port:
//!
//! ```text
//! ConsumptionRecord[] ─► IntensityCalculator ─► ComplianceSnapshot
//!                                                     │
//!                     ShipLedger (banking) ◄──────────┤
//!                             │                       ▼
//!                             └──────► AdjustedBalanceResolver ─► AdjustedBalance
//!                                                                      │
//!                                                   PoolAllocator ◄────┘
//! ```
//!
//! Every mutating call holds the lock of each ship it touches, issues
//! exactly one `CompliancePort::commit` and, once committed, appends its
//! events to the hash-chained audit journal.

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod journal;
pub mod locks;
pub mod resolver;

pub use config::EngineConfig;
pub use engine::ComplianceEngine;
pub use error::{EngineError, EngineResult, ErrorKind, JournalError};
pub use event::EngineEvent;
pub use journal::{verify_chain, AuditJournal, JournalRecord, GENESIS_HASH};
pub use locks::ShipLocks;
pub use resolver::{AdjustedBalance, AdjustedBalanceResolver};
