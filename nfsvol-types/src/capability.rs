// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Visibility of a volume as reported to the orchestrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Volumes exist on this host only
    #[default]
    Local,
}

/// Static capability descriptor for the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    #[serde(rename = "Scope")]
    pub scope: Scope,
}

impl Capability {
    /// State is local to one host and one daemon instance.
    pub const fn local() -> Self {
        Self {
            scope: Scope::Local,
        }
    }
}
