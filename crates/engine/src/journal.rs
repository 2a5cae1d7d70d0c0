//! Audit journal - append-only, hash-chained JSONL
//!
//! Each line is a `JournalRecord`: the event plus its sequence, the hash of
//! the previous record and its own SHA-256 hash. The file is never
//! rewritten; reopening continues the chain from the last line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::JournalError;
use crate::event::EngineEvent;

/// `prev_hash` of the first record
pub const GENESIS_HASH: &str = "GENESIS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub sequence: u64,
    pub prev_hash: String,
    pub hash: String,
    pub event: EngineEvent,
}

impl JournalRecord {
    /// SHA-256 over everything except `hash`
    pub fn calculate_hash(&self) -> Result<String, JournalError> {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_le_bytes());
        hasher.update(self.prev_hash.as_bytes());
        hasher.update(serde_json::to_vec(&self.event)?);
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Verify hash chain integrity
pub fn verify_chain(records: &[JournalRecord]) -> Result<(), JournalError> {
    let mut prev_hash = GENESIS_HASH.to_string();

    for (i, record) in records.iter().enumerate() {
        if record.prev_hash != prev_hash {
            return Err(JournalError::BrokenLink {
                sequence: record.sequence,
                expected: prev_hash,
                actual: record.prev_hash.clone(),
            });
        }

        let calculated = record.calculate_hash()?;
        if record.hash != calculated {
            return Err(JournalError::InvalidHash {
                sequence: record.sequence,
                expected: calculated,
                actual: record.hash.clone(),
            });
        }

        let expected = i as u64 + 1;
        if record.sequence != expected {
            return Err(JournalError::InvalidSequence {
                expected,
                actual: record.sequence,
            });
        }

        prev_hash = record.hash.clone();
    }

    Ok(())
}

pub struct AuditJournal {
    path: PathBuf,
    file: Option<File>,
    /// Records appended in in-memory mode
    memory: Vec<JournalRecord>,
    last_hash: String,
    last_sequence: u64,
}

impl AuditJournal {
    /// Open (or create) a journal file and continue its chain
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut journal = Self {
            path,
            file: Some(file),
            memory: Vec::new(),
            last_hash: GENESIS_HASH.to_string(),
            last_sequence: 0,
        };

        if let Some(last) = journal.read_all()?.pop() {
            journal.last_hash = last.hash;
            journal.last_sequence = last.sequence;
        }
        Ok(journal)
    }

    /// Create an in-memory journal (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
            memory: Vec::new(),
            last_hash: GENESIS_HASH.to_string(),
            last_sequence: 0,
        }
    }

    /// Chain and append an event
    pub fn append(&mut self, event: EngineEvent) -> Result<&str, JournalError> {
        let mut record = JournalRecord {
            sequence: self.last_sequence + 1,
            prev_hash: self.last_hash.clone(),
            hash: String::new(),
            event,
        };
        record.hash = record.calculate_hash()?;

        match self.file {
            Some(ref mut file) => {
                let json = serde_json::to_string(&record)?;
                writeln!(file, "{}", json)?;
                file.flush()?;
            }
            None => self.memory.push(record.clone()),
        }

        self.last_sequence = record.sequence;
        self.last_hash = record.hash;
        Ok(&self.last_hash)
    }

    /// Read every record
    pub fn read_all(&self) -> Result<Vec<JournalRecord>, JournalError> {
        if self.file.is_none() {
            return Ok(self.memory.clone());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    /// Read every record and verify the chain
    pub fn verify(&self) -> Result<usize, JournalError> {
        let records = self.read_all()?;
        verify_chain(&records)?;
        Ok(records.len())
    }

    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    pub fn len(&self) -> u64 {
        self.last_sequence
    }

    pub fn is_empty(&self) -> bool {
        self.last_sequence == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fueleu_core::{ComplianceBalance, ShipId};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn event(year: i32) -> EngineEvent {
        let ship: ShipId = "A".parse().unwrap();
        EngineEvent::snapshot_computed(ship, year, ComplianceBalance::new(dec!(-50)))
    }

    #[test]
    fn test_in_memory_chain() {
        let mut journal = AuditJournal::in_memory();
        assert!(journal.is_empty());

        journal.append(event(2025)).unwrap();
        journal.append(event(2026)).unwrap();

        let records = journal.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prev_hash, GENESIS_HASH);
        assert_eq!(records[1].prev_hash, records[0].hash);
        assert_eq!(journal.last_hash(), records[1].hash);
        assert_eq!(journal.verify().unwrap(), 2);
    }

    #[test]
    fn test_reopen_continues_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit").join("journal.jsonl");

        let first_hash = {
            let mut journal = AuditJournal::open(&path).unwrap();
            journal.append(event(2025)).unwrap().to_string()
        };

        let mut journal = AuditJournal::open(&path).unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.last_hash(), first_hash);

        journal.append(event(2026)).unwrap();
        let records = journal.read_all().unwrap();
        assert_eq!(records[1].sequence, 2);
        assert_eq!(records[1].prev_hash, first_hash);
        assert!(journal.verify().is_ok());
    }

    #[test]
    fn test_tampering_detected() {
        let mut journal = AuditJournal::in_memory();
        journal.append(event(2025)).unwrap();
        journal.append(event(2026)).unwrap();
        journal.append(event(2027)).unwrap();

        let mut records = journal.read_all().unwrap();
        if let EngineEvent::SnapshotComputed { ref mut raw_cb, .. } = records[1].event {
            *raw_cb = ComplianceBalance::new(dec!(50));
        }
        assert!(matches!(
            verify_chain(&records),
            Err(JournalError::InvalidHash { sequence: 2, .. })
        ));

        let mut records = journal.read_all().unwrap();
        records.remove(1);
        assert!(matches!(
            verify_chain(&records),
            Err(JournalError::BrokenLink { sequence: 3, .. })
        ));
    }
}
