// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default directory under which volume mount points are created
pub const DEFAULT_MOUNT_ROOT: &str = "/var/lib/nfs-volume-plugin/volumes";

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("volume name cannot be empty")]
    Empty,

    #[error("volume name is longer than 255 characters")]
    TooLong,

    #[error("volume name {0:?} must start with a letter or digit")]
    InvalidStart(String),

    #[error("volume name {name:?} contains invalid character {ch:?}")]
    InvalidCharacter { name: String, ch: char },
}

/// Check that a volume name is safe to use as a single path component.
///
/// Accepted names start with an ASCII letter or digit and continue with
/// letters, digits, `_`, `.` or `-`.
pub fn validate_volume_name(name: &str) -> Result<(), NameError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(NameError::Empty)?;

    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }

    if !first.is_ascii_alphanumeric() {
        return Err(NameError::InvalidStart(name.to_string()));
    }

    if let Some(ch) = chars.find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))) {
        return Err(NameError::InvalidCharacter {
            name: name.to_string(),
            ch,
        });
    }

    Ok(())
}

/// Derives mount points from volume names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountLayout {
    base: PathBuf,
}

impl MountLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn mount_point(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }
}

impl Default for MountLayout {
    fn default() -> Self {
        Self::new(DEFAULT_MOUNT_ROOT)
    }
}
