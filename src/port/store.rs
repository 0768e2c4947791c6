//! Snapshot persistence port.
//!
//! Stores are synchronous: a save happens between two ticks and must not
//! interleave with another ledger mutation. Saves therefore run on the
//! orchestrator's task and block its worker for the duration of the write
//! (including any fsync). Saves happen on open, close, the periodic snapshot
//! and shutdown. A slow backend should hand the write to its own thread.

use crate::domain::LedgerSnapshot;
use crate::error::PersistenceError;
use crate::service::MetricsSnapshot;

/// Persistence for the trade ledger.
pub trait LedgerStore: Send + Sync {
    /// Load the last saved ledger. `Ok(None)` means a fresh session.
    fn load_ledger(&self) -> Result<Option<LedgerSnapshot>, PersistenceError>;

    /// Replace the saved ledger.
    fn save_ledger(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError>;
}

/// Persistence for performance metrics.
pub trait MetricsStore: Send + Sync {
    /// Load the last saved metrics. `Ok(None)` means a fresh session.
    fn load_metrics(&self) -> Result<Option<MetricsSnapshot>, PersistenceError>;

    /// Replace the saved metrics.
    fn save_metrics(&self, snapshot: &MetricsSnapshot) -> Result<(), PersistenceError>;
}

/// Store that keeps nothing. Used when persistence is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl LedgerStore for NullStore {
    fn load_ledger(&self) -> Result<Option<LedgerSnapshot>, PersistenceError> {
        Ok(None)
    }

    fn save_ledger(&self, _snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        Ok(())
    }
}

impl MetricsStore for NullStore {
    fn load_metrics(&self) -> Result<Option<MetricsSnapshot>, PersistenceError> {
        Ok(None)
    }

    fn save_metrics(&self, _snapshot: &MetricsSnapshot) -> Result<(), PersistenceError> {
        Ok(())
    }
}
