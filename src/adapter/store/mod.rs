//! JSON file snapshot store.
//!
//! Layout under `data_dir`: `ledger.json` and `metrics.json`. Writes go to a
//! sibling `.tmp` file which is fsynced and renamed over the target, so a
//! crash never leaves a half-written snapshot behind. A snapshot that no
//! longer parses is renamed to `*.json.corrupt` so the next save cannot
//! overwrite it.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{LedgerSnapshot, LEDGER_SCHEMA_VERSION};
use crate::error::PersistenceError;
use crate::port::{LedgerStore, MetricsStore};
use crate::service::{MetricsSnapshot, METRICS_SCHEMA_VERSION};

const LEDGER_FILE: &str = "ledger.json";
const METRICS_FILE: &str = "metrics.json";

#[derive(Deserialize)]
struct SchemaHeader {
    schema_version: u32,
}

/// Snapshot store backed by JSON files.
#[derive(Debug)]
pub struct JsonFileStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }

    #[must_use]
    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join(METRICS_FILE)
    }

    fn read<T: DeserializeOwned>(path: &Path, supported: u32) -> Result<Option<T>, PersistenceError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let header: SchemaHeader =
            serde_json::from_str(&json).map_err(|e| Self::set_aside(path, e))?;
        if header.schema_version > supported {
            return Err(PersistenceError::UnsupportedVersion {
                found: header.schema_version,
                supported,
            });
        }

        let value = serde_json::from_str(&json).map_err(|e| Self::set_aside(path, e))?;
        Ok(Some(value))
    }

    fn set_aside(path: &Path, error: serde_json::Error) -> PersistenceError {
        let corrupt = path.with_extension("json.corrupt");
        match fs::rename(path, &corrupt) {
            Ok(()) => warn!(
                path = %path.display(),
                moved_to = %corrupt.display(),
                error = %error,
                "Corrupt snapshot set aside"
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "Could not set aside corrupt snapshot"),
        }
        error.into()
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(value)?;
        let _guard = self.write_lock.lock();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;

        let cleanup_and_err = |e| {
            let _ = fs::remove_file(&temp_path);
            e
        };

        file.write_all(json.as_bytes()).map_err(cleanup_and_err)?;
        file.sync_all().map_err(cleanup_and_err)?;
        fs::rename(&temp_path, path).map_err(cleanup_and_err)?;

        debug!(path = %path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }
}

impl LedgerStore for JsonFileStore {
    fn load_ledger(&self) -> Result<Option<LedgerSnapshot>, PersistenceError> {
        Self::read(&self.ledger_path(), LEDGER_SCHEMA_VERSION)
    }

    fn save_ledger(&self, snapshot: &LedgerSnapshot) -> Result<(), PersistenceError> {
        self.write(&self.ledger_path(), snapshot)
    }
}

impl MetricsStore for JsonFileStore {
    fn load_metrics(&self) -> Result<Option<MetricsSnapshot>, PersistenceError> {
        Self::read(&self.metrics_path(), METRICS_SCHEMA_VERSION)
    }

    fn save_metrics(&self, snapshot: &MetricsSnapshot) -> Result<(), PersistenceError> {
        self.write(&self.metrics_path(), snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    use crate::service::PerformanceTracker;

    fn ledger_snapshot() -> LedgerSnapshot {
        LedgerSnapshot {
            schema_version: LEDGER_SCHEMA_VERSION,
            initial_balance: dec!(10000),
            balance: dec!(9000),
            next_trade_id: 2,
            trades: vec![],
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_missing_files_load_as_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(store.load_ledger().unwrap().is_none());
        assert!(store.load_metrics().unwrap().is_none());
    }

    #[test]
    fn test_ledger_round_trip_creates_parent() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("data"));
        let snapshot = ledger_snapshot();

        store.save_ledger(&snapshot).unwrap();
        assert!(store.ledger_path().exists());
        assert!(!store.ledger_path().with_extension("tmp").exists());

        let loaded = store.load_ledger().unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_metrics_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let now = Utc::now();
        let mut tracker = PerformanceTracker::new(dec!(10000), now);
        tracker.record_trade(dec!(2), dec!(1.5), now);
        let snapshot = tracker.to_snapshot(now);

        store.save_metrics(&snapshot).unwrap();
        assert_eq!(store.load_metrics().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut snapshot = ledger_snapshot();
        snapshot.schema_version = LEDGER_SCHEMA_VERSION + 1;
        store.save_ledger(&snapshot).unwrap();

        let err = store.load_ledger().unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::UnsupportedVersion { found, .. } if found == LEDGER_SCHEMA_VERSION + 1
        ));
    }

    #[test]
    fn test_corrupt_file_is_set_aside() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.ledger_path(), "{ not json").unwrap();

        assert!(matches!(store.load_ledger(), Err(PersistenceError::Json(_))));
        assert!(!store.ledger_path().exists());

        let corrupt = dir.path().join("ledger.json.corrupt");
        assert_eq!(fs::read_to_string(corrupt).unwrap(), "{ not json");

        store.save_ledger(&ledger_snapshot()).unwrap();
        assert!(dir.path().join("ledger.json.corrupt").exists());
    }

    #[test]
    fn test_newer_schema_left_in_place() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.metrics_path(), r#"{"schema_version": 99}"#).unwrap();

        assert!(store.load_metrics().is_err());
        assert!(store.metrics_path().exists());
    }
}
