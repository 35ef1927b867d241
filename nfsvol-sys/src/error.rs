// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use nfsvol_contracts::{VolumeError, VolumeErrorKind};
use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} is not a valid IP address or FQDN")]
    InvalidHost(String),

    #[error("{0} cannot be resolved")]
    Unresolvable(String),

    #[error("lookup of {host} failed: {error}")]
    LookupFailed {
        host: String,
        #[source]
        error: std::io::Error,
    },

    #[error("mount of {device} on {target:?} failed: {errno}")]
    MountFailed {
        device: String,
        target: PathBuf,
        errno: nix::errno::Errno,
    },

    #[error("unmount of {target:?} failed: {errno}")]
    UnmountFailed {
        target: PathBuf,
        errno: nix::errno::Errno,
    },

    #[error("failed to create directory {path:?}: {error}")]
    CreateDir {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("state file {path:?} is malformed: {reason}")]
    StateCorrupt { path: PathBuf, reason: String },

    #[error("invalid mountinfo line: {0}")]
    InvalidMountInfoLine(String),
}

impl SysError {
    pub fn kind(&self) -> VolumeErrorKind {
        match self {
            SysError::InvalidHost(_) | SysError::Unresolvable(_) | SysError::LookupFailed { .. } => {
                VolumeErrorKind::Resolution
            }
            SysError::MountFailed { .. } => VolumeErrorKind::Mount,
            SysError::UnmountFailed { .. } => VolumeErrorKind::Unmount,
            SysError::Io(_)
            | SysError::CreateDir { .. }
            | SysError::StateCorrupt { .. }
            | SysError::InvalidMountInfoLine(_) => VolumeErrorKind::Io,
        }
    }
}

impl From<SysError> for VolumeError {
    fn from(err: SysError) -> Self {
        VolumeError::new(err.kind(), err.to_string())
    }
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
