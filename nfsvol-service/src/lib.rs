// SPDX-License-Identifier: GPL-3.0-only

//! NFS volume plugin daemon
//!
//! Exposes remote NFS exports to Docker as named, reference-counted
//! volumes. The [`registry`] owns the volume table and mount lifecycle; the
//! [`handlers`] translate the plugin HTTP API into registry calls.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod registry;
pub mod server;

use std::sync::Arc;

use nfsvol_contracts::{Reconciler, ResetToZero, VolumeError};
use nfsvol_sys::{DnsResolver, JsonStateStore, MountTableProbe, NfsMountBackend};
use nfsvol_types::MountLayout;

use config::{Config, ReconcileMode};
use registry::{Collaborators, VolumeRegistry};

/// Open the registry described by `config` on top of the real OS backends.
pub fn open_registry(config: &Config) -> Result<VolumeRegistry, VolumeError> {
    let collaborators = Collaborators {
        backend: Arc::new(NfsMountBackend),
        store: Arc::new(JsonStateStore::new(&config.state_file)),
        resolver: Arc::new(DnsResolver),
    };

    let reconciler: Box<dyn Reconciler> = match config.reconcile {
        ReconcileMode::Reset => Box::new(ResetToZero),
        ReconcileMode::Probe => Box::new(MountTableProbe::default()),
    };

    VolumeRegistry::open(
        MountLayout::new(&config.mount_root),
        config.policy,
        collaborators,
        reconciler.as_ref(),
    )
}
