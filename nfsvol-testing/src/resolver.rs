// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::net::IpAddr;

use nfsvol_contracts::{HostResolver, VolumeError, VolumeErrorKind};

/// Resolver with a fixed host table; literal addresses pass through
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, name: &str, address: &str) -> Self {
        self.hosts.insert(name.to_string(), address.to_string());
        self
    }
}

impl HostResolver for StaticResolver {
    fn resolve(&self, identifier: &str) -> Result<String, VolumeError> {
        if identifier.parse::<IpAddr>().is_ok() {
            return Ok(identifier.to_string());
        }

        self.hosts.get(identifier).cloned().ok_or_else(|| {
            VolumeError::new(
                VolumeErrorKind::Resolution,
                format!("{identifier} cannot be resolved"),
            )
        })
    }
}
