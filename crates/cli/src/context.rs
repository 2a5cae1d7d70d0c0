//! Application context - wires config, store and engine together

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use fueleu_engine::{ComplianceEngine, EngineConfig};
use fueleu_store::SqliteStore;
use tracing::debug;

/// Journal file used when the config names none
pub const DEFAULT_JOURNAL_FILE: &str = "journal.jsonl";

pub struct AppContext {
    pub engine: ComplianceEngine<SqliteStore>,
    db_path: PathBuf,
}

impl AppContext {
    /// Open the database and journal described by `db_path` and the config
    /// file. The journal defaults to a file next to the database.
    pub fn new(db_path: impl AsRef<Path>, config_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();
        let config = EngineConfig::from_file(config_path)
            .with_context(|| format!("loading config {}", config_path.display()))?;
        Self::with_config(db_path, config)
    }

    pub fn with_config(db_path: impl AsRef<Path>, mut config: EngineConfig) -> anyhow::Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let dir = db_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;

        if config.journal_path.is_none() {
            config.journal_path = Some(dir.join(DEFAULT_JOURNAL_FILE));
        }
        debug!(db = %db_path.display(), journal = ?config.journal_path, "Opening store");

        let store = SqliteStore::new(&db_path)
            .with_context(|| format!("opening database {}", db_path.display()))?;
        let engine = ComplianceEngine::new(config, store)?;

        Ok(Self { engine, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
