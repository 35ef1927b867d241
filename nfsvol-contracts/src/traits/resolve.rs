// SPDX-License-Identifier: GPL-3.0-only

use crate::VolumeError;

/// Turns a user supplied server identifier into a concrete address
pub trait HostResolver: Send + Sync {
    fn resolve(&self, identifier: &str) -> Result<String, VolumeError>;
}
