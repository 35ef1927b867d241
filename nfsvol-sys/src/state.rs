// SPDX-License-Identifier: GPL-3.0-only

//! Durable volume table
//!
//! The whole table is rewritten on every change. Each write lands in a
//! sibling temporary file which is synced and then renamed over the state
//! file, so a crash leaves either the old or the new snapshot on disk.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use nfsvol_contracts::{StateStore, VolumeError};
use nfsvol_types::VolumeRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SysError};

pub const DEFAULT_STATE_FILE: &str = "/var/lib/nfs-volume-plugin/state.json";

const STATE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    volumes: Vec<VolumeRecord>,
}

/// JSON snapshot store
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    pub fn write_snapshot(&self, records: &[VolumeRecord]) -> Result<()> {
        let snapshot = StateFile {
            version: STATE_VERSION,
            volumes: records.to_vec(),
        };
        let contents =
            serde_json::to_vec_pretty(&snapshot).map_err(|e| SysError::StateCorrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        {
            let mut file = File::create(&temp)?;
            file.write_all(&contents)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;

        debug!("Wrote {} volume(s) to {:?}", records.len(), self.path);
        Ok(())
    }

    pub fn read_snapshot(&self) -> Result<Vec<VolumeRecord>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No state file at {:?}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(SysError::Io(e)),
        };

        let snapshot: StateFile =
            serde_json::from_slice(&contents).map_err(|e| SysError::StateCorrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        if snapshot.version != STATE_VERSION {
            return Err(SysError::StateCorrupt {
                path: self.path.clone(),
                reason: format!("unsupported version {}", snapshot.version),
            });
        }

        info!(
            "Loaded {} volume(s) from {:?}",
            snapshot.volumes.len(),
            self.path
        );
        Ok(snapshot.volumes)
    }
}

impl Default for JsonStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_STATE_FILE)
    }
}

impl StateStore for JsonStateStore {
    fn persist(&self, records: &[VolumeRecord]) -> std::result::Result<(), VolumeError> {
        self.write_snapshot(records).map_err(VolumeError::from)
    }

    fn load(&self) -> std::result::Result<Vec<VolumeRecord>, VolumeError> {
        self.read_snapshot().map_err(VolumeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfsvol_contracts::VolumeErrorKind;

    fn record(name: &str) -> VolumeRecord {
        VolumeRecord::new(
            name,
            "10.0.0.5",
            format!("/export/{name}"),
            None,
            PathBuf::from("/mnt/volumes").join(name),
        )
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn persisted_records_come_back_with_zero_ref_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("nested/state.json"));

        let mut mounted = record("a");
        mounted.ref_count = 2;
        store.persist(&[mounted, record("b")]).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "a");
        assert!(loaded.iter().all(|r| r.ref_count == 0));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn persist_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));

        store.persist(&[record("a"), record("b")]).unwrap();
        store.persist(&[record("b")]).unwrap();

        let names: Vec<String> = store.load().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b".to_string()]);
    }

    #[test]
    fn malformed_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not json").unwrap();

        let err = JsonStateStore::new(&path).load().unwrap_err();
        assert_eq!(err.kind(), VolumeErrorKind::Io);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, br#"{"version":9,"volumes":[]}"#).unwrap();

        let err = JsonStateStore::new(&path).read_snapshot().unwrap_err();
        assert!(matches!(err, SysError::StateCorrupt { .. }));
    }
}
