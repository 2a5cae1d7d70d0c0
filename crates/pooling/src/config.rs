//! Pooling configuration

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Which surplus members donate first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DonorOrder {
    /// Descending pre-pool surplus
    #[default]
    LargestSurplusFirst,
    /// Ascending pre-pool surplus
    SmallestSurplusFirst,
    /// Position in the membership request
    MemberOrder,
}

/// Configuration for the PoolAllocator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolingConfig {
    #[serde(default)]
    pub donor_order: DonorOrder,

    /// Minimum distinct members; values below 2 are treated as 2
    #[serde(default = "default_min_members")]
    pub min_members: usize,
}

fn default_min_members() -> usize {
    2
}

impl Default for PoolingConfig {
    fn default() -> Self {
        Self {
            donor_order: DonorOrder::default(),
            min_members: default_min_members(),
        }
    }
}
