// SPDX-License-Identifier: GPL-3.0-only

use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SysError};

/// Create `path` with `mode` unless it already exists as a directory.
pub fn ensure_dir(path: &Path, recursive: bool, mode: u32) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    debug!("Creating directory {:?} (mode {:o})", path, mode);
    DirBuilder::new()
        .recursive(recursive)
        .mode(mode)
        .create(path)
        .map_err(|error| SysError::CreateDir {
            path: path.to_path_buf(),
            error,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn creates_nested_directories_with_mode() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("a/b/c");

        ensure_dir(&target, true, 0o700).unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert!(target.is_dir());
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn existing_directory_is_left_alone() {
        let root = tempfile::tempdir().unwrap();
        ensure_dir(root.path(), true, 0o700).unwrap();
        ensure_dir(root.path(), false, 0o700).unwrap();
    }

    #[test]
    fn non_recursive_fails_without_parent() {
        let root = tempfile::tempdir().unwrap();
        let err = ensure_dir(&root.path().join("x/y"), false, 0o700).unwrap_err();
        assert!(matches!(err, SysError::CreateDir { .. }));
    }
}
