// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use crate::VolumeError;

/// Everything the backend needs to attach one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountParams {
    pub server: String,
    pub export_path: String,
    pub target: PathBuf,
    /// Full option string, already including `nolock` and `addr=`
    pub options: String,
}

/// OS mount primitives for network filesystems.
///
/// Calls are synchronous and may block for as long as the remote server
/// takes to answer. Failures are reported with `VolumeErrorKind::Mount` or
/// `VolumeErrorKind::Unmount`.
pub trait MountBackend: Send + Sync {
    fn mount(&self, params: &MountParams) -> Result<(), VolumeError>;

    fn unmount(&self, target: &Path) -> Result<(), VolumeError>;
}
