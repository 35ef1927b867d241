// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use nfsvol_contracts::{MountBackend, MountParams, VolumeError, VolumeErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Mount(MountParams),
    Unmount(PathBuf),
}

/// Mount backend that only records calls
#[derive(Debug, Default)]
pub struct RecordingMountBackend {
    calls: Mutex<Vec<BackendCall>>,
    fail_mount: AtomicBool,
    fail_unmount: AtomicBool,
}

impl RecordingMountBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following mount fail until reset
    pub fn fail_mounts(&self, fail: bool) {
        self.fail_mount.store(fail, Ordering::SeqCst);
    }

    pub fn fail_unmounts(&self, fail: bool) {
        self.fail_unmount.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn mounts(&self) -> Vec<MountParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Mount(params) => Some(params),
                BackendCall::Unmount(_) => None,
            })
            .collect()
    }

    pub fn unmounts(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Unmount(target) => Some(target),
                BackendCall::Mount(_) => None,
            })
            .collect()
    }

    fn record(&self, call: BackendCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

impl MountBackend for RecordingMountBackend {
    fn mount(&self, params: &MountParams) -> Result<(), VolumeError> {
        self.record(BackendCall::Mount(params.clone()));
        if self.fail_mount.load(Ordering::SeqCst) {
            return Err(VolumeError::new(
                VolumeErrorKind::Mount,
                format!("mount of {:?} failed: EIO", params.target),
            ));
        }
        Ok(())
    }

    fn unmount(&self, target: &Path) -> Result<(), VolumeError> {
        self.record(BackendCall::Unmount(target.to_path_buf()));
        if self.fail_unmount.load(Ordering::SeqCst) {
            return Err(VolumeError::new(
                VolumeErrorKind::Unmount,
                format!("unmount of {:?} failed: EBUSY", target),
            ));
        }
        Ok(())
    }
}
