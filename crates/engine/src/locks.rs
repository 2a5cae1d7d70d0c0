//! Per-ship critical sections
//!
//! Each ship gets a lazily created `Mutex<()>`. Multi-ship sections take
//! the locks in ascending `ShipId` order so overlapping requests cannot
//! deadlock.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use fueleu_core::ShipId;

use crate::error::{EngineError, EngineResult};

type Handle = Arc<Mutex<()>>;

#[derive(Debug, Default)]
pub struct ShipLocks {
    table: Mutex<HashMap<ShipId, Handle>>,
}

impl ShipLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, ship_id: &ShipId) -> EngineResult<Handle> {
        let mut table = self
            .table
            .lock()
            .map_err(|_| EngineError::LockPoisoned("lock table".to_string()))?;
        Ok(table.entry(ship_id.clone()).or_default().clone())
    }

    /// Run `f` while holding the ship's lock
    pub fn with_ship<T>(
        &self,
        ship_id: &ShipId,
        f: impl FnOnce() -> EngineResult<T>,
    ) -> EngineResult<T> {
        let handle = self.handle(ship_id)?;
        let _guard = acquire(ship_id, &handle)?;
        f()
    }

    /// Run `f` while holding every listed ship's lock.
    /// Duplicates are ignored; acquisition is in ascending `ShipId` order.
    pub fn with_ships<T>(
        &self,
        ship_ids: &[ShipId],
        f: impl FnOnce() -> EngineResult<T>,
    ) -> EngineResult<T> {
        let ordered: BTreeSet<&ShipId> = ship_ids.iter().collect();
        let mut handles = Vec::with_capacity(ordered.len());
        for ship_id in &ordered {
            handles.push((*ship_id, self.handle(ship_id)?));
        }

        let mut guards = Vec::with_capacity(handles.len());
        for (ship_id, handle) in &handles {
            guards.push(acquire(ship_id, handle)?);
        }

        f()
    }

    /// Number of ships that have been locked at least once
    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn acquire<'a>(ship_id: &ShipId, handle: &'a Handle) -> EngineResult<MutexGuard<'a, ()>> {
    handle
        .lock()
        .map_err(|_| EngineError::LockPoisoned(ship_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn id(s: &str) -> ShipId {
        s.parse().unwrap()
    }

    #[test]
    fn test_same_ship_sections_do_not_overlap() {
        let locks = ShipLocks::new();
        let inside = AtomicUsize::new(0);
        let max_seen = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        locks
                            .with_ship(&id("A"), || {
                                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                                max_seen.fetch_max(now, Ordering::SeqCst);
                                inside.fetch_sub(1, Ordering::SeqCst);
                                Ok(())
                            })
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_overlapping_multi_ship_sections_do_not_deadlock() {
        let locks = ShipLocks::new();
        let count = AtomicUsize::new(0);

        thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..200 {
                    locks
                        .with_ships(&[id("C"), id("A"), id("B")], || {
                            count.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                }
            });
            s.spawn(|| {
                for _ in 0..200 {
                    locks
                        .with_ships(&[id("B"), id("C"), id("B")], || {
                            count.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                }
            });
        });

        assert_eq!(count.load(Ordering::SeqCst), 400);
        assert_eq!(locks.len(), 3);
    }
}
