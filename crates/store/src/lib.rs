//! FuelEU persistence boundary
//!
//! The engine never performs I/O directly. Everything it reads or writes
//! goes through [`CompliancePort`]; every mutation is one [`UnitOfWork`]
//! that an adapter applies atomically.
//!
//! Adapters:
//! - [`InMemoryStore`] - mutex-guarded maps, for tests and embedding
//! - [`SqliteStore`] - `rusqlite`, one SQLite transaction per commit

pub mod error;
pub mod memory;
pub mod port;
pub mod sqlite;

pub use error::{PortError, PortResult};
pub use memory::InMemoryStore;
pub use port::{CompliancePort, UnitOfWork};
pub use sqlite::SqliteStore;
