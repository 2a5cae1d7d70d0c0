//! Engine configuration
//!
//! One JSON document carries every component's settings. Banking's
//! regulatory numbers are required; everything else has a default.

use std::path::{Path, PathBuf};

use fueleu_banking::BankingConfig;
use fueleu_intensity::{IntensityConfig, TargetSchedule};
use fueleu_pooling::PoolingConfig;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub intensity: IntensityConfig,

    pub banking: BankingConfig,

    #[serde(default)]
    pub pooling: PoolingConfig,

    /// Fallback target schedule for years without a stored target
    #[serde(default = "TargetSchedule::fuel_eu_maritime")]
    pub targets: TargetSchedule,

    /// Append-only audit journal file; in-memory when absent
    #[serde(default)]
    pub journal_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn new(banking: BankingConfig) -> Self {
        Self {
            intensity: IntensityConfig::default(),
            banking,
            pooling: PoolingConfig::default(),
            targets: TargetSchedule::fuel_eu_maritime(),
            journal_path: None,
        }
    }

    /// Load and validate configuration from a JSON file
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.banking.validate()?;
        if self.intensity.cb_unit_divisor <= rust_decimal::Decimal::ZERO {
            return Err(EngineError::Config(
                "intensity.cb_unit_divisor must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
