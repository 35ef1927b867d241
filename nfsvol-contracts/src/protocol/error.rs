// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeErrorKind {
    /// Missing, empty or malformed request input
    Validation,
    /// Server identifier could not be turned into an address
    Resolution,
    AlreadyExists,
    NotFound,
    /// The mount syscall failed
    Mount,
    /// The unmount syscall failed
    Unmount,
    /// Persistence or directory creation failed
    Io,
    /// Volume still has mount holders
    InUse,
}

impl VolumeErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Resolution => "resolution",
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::Mount => "mount",
            Self::Unmount => "unmount",
            Self::Io => "io",
            Self::InUse => "in_use",
        }
    }
}

impl std::fmt::Display for VolumeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every registry operation and backend seam.
///
/// Only the message crosses the plugin boundary; the kind stays available
/// to callers inside the process.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct VolumeError {
    pub kind: VolumeErrorKind,
    pub message: String,
}

impl VolumeError {
    pub fn new(kind: VolumeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(VolumeErrorKind::Validation, message)
    }

    pub fn not_found(name: &str) -> Self {
        Self::new(VolumeErrorKind::NotFound, format!("volume {name} not found"))
    }

    pub fn already_exists(name: &str) -> Self {
        Self::new(
            VolumeErrorKind::AlreadyExists,
            format!("volume {name} already exists"),
        )
    }

    pub fn in_use(name: &str, holders: u32) -> Self {
        Self::new(
            VolumeErrorKind::InUse,
            format!("volume {name} is in use by {holders} mount(s)"),
        )
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(VolumeErrorKind::Io, message)
    }

    pub fn kind(&self) -> VolumeErrorKind {
        self.kind
    }
}
