//! FuelEU Pool Allocator (Article 21)
//!
//! Forms a pool from members' Adjusted CB for a shared year and moves just
//! enough surplus to cure every deficit member.
//!
//! ## Invariants (checked after every allocation)
//!
//! - Conservation: `Σ post_cb == Σ pre_cb`
//! - No worse off: a member's deficit exposure never grows. Deficit members
//!   end with `post_cb >= pre_cb`; surplus members end with `post_cb >= 0`.
//!
//! A violation fails the whole formation; nothing is returned to persist.

pub mod allocator;
pub mod config;
pub mod error;
pub mod pool;

pub use allocator::{PoolAllocator, PoolFormation};
pub use config::{DonorOrder, PoolingConfig};
pub use error::{PoolError, PoolResult};
pub use pool::{Pool, PoolAllocation};
