// SPDX-License-Identifier: GPL-3.0-only

use nfsvol_types::VolumeRecord;

use crate::VolumeError;

/// Decides the reference count a loaded record starts with
pub trait Reconciler: Send + Sync {
    fn initial_ref_count(&self, record: &VolumeRecord) -> Result<u32, VolumeError>;
}

/// Trust nothing from before the restart: every volume starts unmounted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetToZero;

impl Reconciler for ResetToZero {
    fn initial_ref_count(&self, _record: &VolumeRecord) -> Result<u32, VolumeError> {
        Ok(0)
    }
}
