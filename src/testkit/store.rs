//! In-memory snapshot stores.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::domain::LedgerSnapshot;
use crate::error::PersistenceError;
use crate::port::{LedgerStore, MetricsStore};
use crate::service::MetricsSnapshot;

/// Holds the latest snapshots in memory. Saves fail while `set_failing(true)`.
#[derive(Default)]
pub struct MemoryStore {
    ledger: Mutex<Option<LedgerSnapshot>>,
    metrics: Mutex<Option<MetricsSnapshot>>,
    failing: AtomicBool,
    saves: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful saves of either snapshot.
    pub fn saves(&self) -> u32 {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn ledger(&self) -> Option<LedgerSnapshot> {
        self.ledger.lock().clone()
    }

    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.lock().clone()
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "store offline").into());
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn load_ledger(&self) -> Result<Option<LedgerSnapshot>, PersistenceError> {
        Ok(self.ledger())
    }

    fn save_ledger(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        self.check()?;
        *self.ledger.lock() = Some(snapshot.clone());
        Ok(())
    }
}

impl MetricsStore for MemoryStore {
    fn load_metrics(&self) -> Result<Option<MetricsSnapshot>, PersistenceError> {
        Ok(self.metrics())
    }

    fn save_metrics(&self, snapshot: &MetricsSnapshot) -> Result<(), PersistenceError> {
        self.check()?;
        *self.metrics.lock() = Some(snapshot.clone());
        Ok(())
    }
}
