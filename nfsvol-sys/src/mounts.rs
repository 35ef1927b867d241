// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use nfsvol_contracts::{Reconciler, VolumeError};
use nfsvol_types::VolumeRecord;
use tracing::{debug, info};

use crate::error::{Result, SysError};

pub const PROC_MOUNTINFO: &str = "/proc/self/mountinfo";

/// One line of `/proc/self/mountinfo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub mount_point: PathBuf,
    pub fs_type: String,
    pub source: String,
}

impl MountEntry {
    pub fn is_nfs(&self) -> bool {
        self.fs_type == "nfs" || self.fs_type == "nfs4"
    }
}

pub fn read_mount_table(path: &Path) -> Result<Vec<MountEntry>> {
    let mount_info = fs::read_to_string(path)?;
    parse_mountinfo(&mount_info)
}

pub fn parse_mountinfo(input: &str) -> Result<Vec<MountEntry>> {
    let mut entries = Vec::new();

    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let (left, right) = line
            .split_once(" - ")
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;

        let mount_point = left
            .split_whitespace()
            .nth(4)
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;

        let mut right_fields = right.split_whitespace();
        let fs_type = right_fields
            .next()
            .ok_or_else(|| SysError::InvalidMountInfoLine(line.to_string()))?;
        let source = right_fields.next().unwrap_or_default();

        entries.push(MountEntry {
            mount_point: PathBuf::from(unescape_mount_field(mount_point)),
            fs_type: fs_type.to_string(),
            source: unescape_mount_field(source),
        });
    }

    Ok(entries)
}

/// Decode the `\ooo` octal escapes the kernel uses for spaces, tabs,
/// newlines and backslashes in mountinfo fields.
fn unescape_mount_field(value: &str) -> String {
    let raw = value.as_bytes();
    let mut decoded = Vec::with_capacity(raw.len());
    let mut rest = raw;

    while let Some((&byte, tail)) = rest.split_first() {
        let escaped = match tail {
            [a, b, c, ..] if byte == b'\\' && [a, b, c].iter().all(|d| is_octal(d)) => {
                Some(((a - b'0') << 6) | ((b - b'0') << 3) | (c - b'0'))
            }
            _ => None,
        };

        match escaped {
            Some(decoded_byte) => {
                decoded.push(decoded_byte);
                rest = &tail[3..];
            }
            None => {
                decoded.push(byte);
                rest = tail;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn is_octal(digit: &u8) -> bool {
    (b'0'..=b'7').contains(digit)
}

/// Reconciler that trusts the kernel mount table over the reset counter.
///
/// A volume whose mount point already carries an NFS mount starts with one
/// holder, so the next Unmount releases it instead of leaking it.
#[derive(Debug, Clone)]
pub struct MountTableProbe {
    mountinfo: PathBuf,
}

impl MountTableProbe {
    pub fn new(mountinfo: impl Into<PathBuf>) -> Self {
        Self {
            mountinfo: mountinfo.into(),
        }
    }
}

impl Default for MountTableProbe {
    fn default() -> Self {
        Self::new(PROC_MOUNTINFO)
    }
}

impl Reconciler for MountTableProbe {
    fn initial_ref_count(&self, record: &VolumeRecord) -> std::result::Result<u32, VolumeError> {
        let table = read_mount_table(&self.mountinfo)?;
        let mounted = table
            .iter()
            .find(|entry| entry.is_nfs() && entry.mount_point == record.mount_point);

        if let Some(entry) = mounted {
            info!(
                "Volume {} is still mounted from {} at {:?}, adopting it",
                record.name, entry.source, record.mount_point
            );
            Ok(1)
        } else {
            debug!("Volume {} is not mounted", record.name);
            Ok(0)
        }
    }
}
