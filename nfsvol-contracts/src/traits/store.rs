// SPDX-License-Identifier: GPL-3.0-only

use nfsvol_types::VolumeRecord;

use crate::VolumeError;

/// Durable record set, one entry per volume.
///
/// Reference counts are never stored; `load` returns every record with a
/// count of zero.
pub trait StateStore: Send + Sync {
    fn persist(&self, records: &[VolumeRecord]) -> Result<(), VolumeError>;

    fn load(&self) -> Result<Vec<VolumeRecord>, VolumeError>;
}
