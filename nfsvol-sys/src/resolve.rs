// SPDX-License-Identifier: GPL-3.0-only

//! Server identifier resolution
//!
//! Resolution happens once, when a volume is created. There is no caching
//! and no retry.

use std::net::{IpAddr, ToSocketAddrs};

use nfsvol_contracts::{HostResolver, VolumeError};
use tracing::debug;

use crate::error::{Result, SysError};

const MAX_FQDN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Resolve `name` to a single address.
///
/// Literal IP addresses are returned unchanged without touching the network.
/// Anything else must be a fully-qualified domain name and is looked up
/// through the system resolver; the first address returned wins.
pub fn host_lookup(name: &str) -> Result<String> {
    if name.parse::<IpAddr>().is_ok() {
        return Ok(name.to_string());
    }

    if !is_valid_fqdn(name) {
        return Err(SysError::InvalidHost(name.to_string()));
    }

    debug!("Looking up {}", name);
    let mut addrs = (name, 0u16)
        .to_socket_addrs()
        .map_err(|error| SysError::LookupFailed {
            host: name.to_string(),
            error,
        })?;

    match addrs.next() {
        Some(addr) => {
            let address = addr.ip().to_string();
            debug!("Resolved {} to {}", name, address);
            Ok(address)
        }
        None => Err(SysError::Unresolvable(name.to_string())),
    }
}

/// Syntactic FQDN check: at least two dot-separated labels of letters,
/// digits and inner hyphens, with a non-numeric top-level label.
pub fn is_valid_fqdn(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() || name.len() > MAX_FQDN_LEN {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    let tld_ok = labels
        .last()
        .is_some_and(|tld| !tld.chars().all(|c| c.is_ascii_digit()));

    labels_ok && tld_ok
}

/// Resolver backed by the system's name service
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsResolver;

impl HostResolver for DnsResolver {
    fn resolve(&self, identifier: &str) -> std::result::Result<String, VolumeError> {
        host_lookup(identifier).map_err(VolumeError::from)
    }
}
