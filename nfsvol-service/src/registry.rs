// SPDX-License-Identifier: GPL-3.0-only

//! Volume registry and mount lifecycle
//!
//! The registry owns every `VolumeRecord` and decides when a request turns
//! into a physical mount. A volume is mounted when its first holder arrives
//! and unmounted when its last holder leaves; everything in between only
//! moves the counter.
//!
//! A single readers-writer lock guards the whole table. Create, Remove,
//! Mount and Unmount hold the write lock for their full duration, including
//! the mount syscall and the state write. List, Get and Path share the read
//! lock. All methods block, so async callers must run them on
//! `tokio::task::spawn_blocking`.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use nfsvol_contracts::{
    HostResolver, MountBackend, MountParams, Reconciler, StateStore, VolumeError,
};
use nfsvol_sys::ensure_dir;
use nfsvol_types::{Capability, MountLayout, VolumeRecord, VolumeSummary, validate_volume_name};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub const OPT_SERVER: &str = "server";
pub const OPT_PATH: &str = "path";
pub const OPT_MOUNT_OPTIONS: &str = "opts";

const KNOWN_OPTIONS: [&str; 3] = [OPT_SERVER, OPT_PATH, OPT_MOUNT_OPTIONS];

/// Set by [`mount_options`] on every mount
const RESERVED_MOUNT_OPTIONS: [&str; 3] = ["nolock", "lock", "addr"];

/// Mount point directories are only reachable by root
const MOUNT_DIR_MODE: u32 = 0o700;

/// How strictly the registry guards physical state against logical state.
///
/// The default is lenient: Remove drops a mounted volume without unmounting
/// it, and a failed unmount still leaves the counter at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryPolicy {
    /// Reject Remove while the volume has holders
    pub refuse_remove_in_use: bool,
    /// Restore the previous count when the last unmount fails
    pub keep_count_on_unmount_failure: bool,
}

impl RegistryPolicy {
    pub fn strict() -> Self {
        Self {
            refuse_remove_in_use: true,
            keep_count_on_unmount_failure: true,
        }
    }
}

/// External collaborators the registry calls into
#[derive(Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn MountBackend>,
    pub store: Arc<dyn StateStore>,
    pub resolver: Arc<dyn HostResolver>,
}

pub struct VolumeRegistry {
    volumes: RwLock<BTreeMap<String, VolumeRecord>>,
    layout: MountLayout,
    policy: RegistryPolicy,
    backend: Arc<dyn MountBackend>,
    store: Arc<dyn StateStore>,
    resolver: Arc<dyn HostResolver>,
}

impl VolumeRegistry {
    /// Empty registry
    pub fn new(layout: MountLayout, policy: RegistryPolicy, collaborators: Collaborators) -> Self {
        Self::with_records(layout, policy, collaborators, BTreeMap::new())
    }

    /// Registry seeded from the state store.
    ///
    /// Each loaded record gets its starting count from `reconciler`. A
    /// reconciler failure is logged and the volume starts at zero.
    pub fn open(
        layout: MountLayout,
        policy: RegistryPolicy,
        collaborators: Collaborators,
        reconciler: &dyn Reconciler,
    ) -> Result<Self, VolumeError> {
        let records = collaborators.store.load()?;
        let mut volumes = BTreeMap::new();
        let mut migrated = false;

        for mut record in records {
            if let Err(e) = validate_volume_name(&record.name) {
                warn!("Skipping stored volume with invalid name: {}", e);
                continue;
            }

            let derived = layout.mount_point(&record.name);
            if record.mount_point != derived {
                warn!(
                    "Volume {} is recorded at {:?}, moving it to {:?}",
                    record.name, record.mount_point, derived
                );
                record.mount_point = derived;
                migrated = true;
            }

            record.ref_count = match reconciler.initial_ref_count(&record) {
                Ok(count) => count,
                Err(e) => {
                    warn!("Failed to reconcile volume {}: {}", record.name, e);
                    0
                }
            };

            volumes.insert(record.name.clone(), record);
        }

        info!(
            "Registry opened with {} volume(s) under {:?}",
            volumes.len(),
            layout.base()
        );
        if migrated {
            write_state(collaborators.store.as_ref(), &volumes);
        }
        Ok(Self::with_records(layout, policy, collaborators, volumes))
    }

    fn with_records(
        layout: MountLayout,
        policy: RegistryPolicy,
        collaborators: Collaborators,
        volumes: BTreeMap<String, VolumeRecord>,
    ) -> Self {
        Self {
            volumes: RwLock::new(volumes),
            layout,
            policy,
            backend: collaborators.backend,
            store: collaborators.store,
            resolver: collaborators.resolver,
        }
    }

    /// Register a new volume from its creation options.
    ///
    /// `server` and `path` are mandatory and non-empty; `opts` is optional.
    /// The server is resolved here, once. Duplicate names are rejected.
    pub fn create(&self, name: &str, options: &HashMap<String, String>) -> Result<(), VolumeError> {
        let mut volumes = self.volumes.blocking_write();

        validate_volume_name(name).map_err(|e| VolumeError::validation(e.to_string()))?;
        validate_options(options)?;

        let server = required_option(options, OPT_SERVER)?;
        let export_path = required_option(options, OPT_PATH)?;
        let extra = options
            .get(OPT_MOUNT_OPTIONS)
            .map(|opts| opts.trim().to_string())
            .filter(|opts| !opts.is_empty());
        if let Some(extra) = extra.as_deref() {
            validate_mount_options(extra)?;
        }

        let address = self.resolver.resolve(server)?;
        debug!("Resolved server {} to {}", server, address);

        if volumes.contains_key(name) {
            return Err(VolumeError::already_exists(name));
        }

        let record = VolumeRecord::new(
            name,
            address,
            export_path,
            extra,
            self.layout.mount_point(name),
        );
        info!(
            "Created volume {} ({}:{}) at {:?}",
            name, record.server, record.export_path, record.mount_point
        );
        volumes.insert(name.to_string(), record);

        self.persist(&volumes);
        Ok(())
    }

    pub fn list(&self) -> Vec<VolumeSummary> {
        let volumes = self.volumes.blocking_read();
        volumes.values().map(VolumeRecord::summary).collect()
    }

    /// Snapshot of one record, including its current reference count
    pub fn get(&self, name: &str) -> Result<VolumeRecord, VolumeError> {
        let volumes = self.volumes.blocking_read();
        volumes
            .get(name)
            .cloned()
            .ok_or_else(|| VolumeError::not_found(name))
    }

    /// Mount point derived from the name; the volume need not be mounted.
    pub fn path(&self, name: &str) -> Result<PathBuf, VolumeError> {
        let volumes = self.volumes.blocking_read();
        if !volumes.contains_key(name) {
            return Err(VolumeError::not_found(name));
        }
        Ok(self.layout.mount_point(name))
    }

    /// Take one hold on the volume, mounting it if this is the first.
    ///
    /// An existing hold is trusted: the mount table is not re-checked.
    pub fn mount(&self, name: &str) -> Result<PathBuf, VolumeError> {
        let mut volumes = self.volumes.blocking_write();
        let record = volumes
            .get_mut(name)
            .ok_or_else(|| VolumeError::not_found(name))?;

        if !record.is_mounted() {
            ensure_dir(&record.mount_point, true, MOUNT_DIR_MODE)?;

            let params = MountParams {
                server: record.server.clone(),
                export_path: record.export_path.clone(),
                target: record.mount_point.clone(),
                options: mount_options(record),
            };
            if let Err(e) = self.backend.mount(&params) {
                warn!("Mount of volume {} failed: {}", name, e);
                return Err(e);
            }
            info!("Mounted volume {} at {:?}", name, record.mount_point);
        }

        record.ref_count = record.ref_count.saturating_add(1);
        debug!("Volume {} has {} holder(s)", name, record.ref_count);
        Ok(record.mount_point.clone())
    }

    /// Release one hold, unmounting when the last holder leaves.
    ///
    /// Releasing a volume with no holders is a no-op.
    pub fn unmount(&self, name: &str) -> Result<(), VolumeError> {
        let mut volumes = self.volumes.blocking_write();
        let record = volumes
            .get_mut(name)
            .ok_or_else(|| VolumeError::not_found(name))?;

        let previous = record.ref_count;
        if previous == 0 {
            debug!("Volume {} has no holders, nothing to unmount", name);
            return Ok(());
        }

        record.ref_count = previous - 1;
        if record.ref_count > 0 {
            debug!("Volume {} has {} holder(s)", name, record.ref_count);
            return Ok(());
        }

        if let Err(e) = self.backend.unmount(&record.mount_point) {
            if self.policy.keep_count_on_unmount_failure {
                record.ref_count = previous;
            }
            warn!(
                "Unmount of volume {} failed, {} holder(s) recorded: {}",
                name, record.ref_count, e
            );
            return Err(e);
        }

        info!("Unmounted volume {} from {:?}", name, record.mount_point);
        Ok(())
    }

    /// Forget a volume.
    ///
    /// Under the lenient policy a mounted volume is dropped without being
    /// unmounted. The strict policy refuses with `InUse`; see
    /// [`force_remove`](Self::force_remove).
    pub fn remove(&self, name: &str) -> Result<(), VolumeError> {
        self.remove_volume(name, false)
    }

    /// Forget a volume even if it still has holders.
    ///
    /// One last unmount is attempted for a held volume; its failure is
    /// logged and does not stop the removal.
    pub fn force_remove(&self, name: &str) -> Result<(), VolumeError> {
        self.remove_volume(name, true)
    }

    fn remove_volume(&self, name: &str, force: bool) -> Result<(), VolumeError> {
        let mut volumes = self.volumes.blocking_write();
        let record = volumes
            .get(name)
            .ok_or_else(|| VolumeError::not_found(name))?;

        if record.is_mounted() {
            if force {
                warn!(
                    "Force removing volume {} with {} holder(s)",
                    name, record.ref_count
                );
                if let Err(e) = self.backend.unmount(&record.mount_point) {
                    warn!("Leaving {:?} mounted: {}", record.mount_point, e);
                }
            } else if self.policy.refuse_remove_in_use {
                return Err(VolumeError::in_use(name, record.ref_count));
            } else {
                warn!(
                    "Removing volume {} while it still has {} holder(s); {:?} stays mounted",
                    name, record.ref_count, record.mount_point
                );
            }
        } else if let Err(e) = std::fs::remove_dir(&record.mount_point) {
            debug!("Left mount point {:?} in place: {}", record.mount_point, e);
        }

        volumes.remove(name);
        info!("Removed volume {}", name);

        self.persist(&volumes);
        Ok(())
    }

    pub fn capabilities(&self) -> Capability {
        Capability::local()
    }

    fn persist(&self, volumes: &BTreeMap<String, VolumeRecord>) {
        write_state(self.store.as_ref(), volumes);
    }
}

fn write_state(store: &dyn StateStore, volumes: &BTreeMap<String, VolumeRecord>) {
    let records: Vec<VolumeRecord> = volumes.values().cloned().collect();
    if let Err(e) = store.persist(&records) {
        error!("Failed to persist volume state: {}", e);
    }
}

fn validate_options(options: &HashMap<String, String>) -> Result<(), VolumeError> {
    let mut unknown: Vec<&str> = options
        .keys()
        .map(String::as_str)
        .filter(|key| !KNOWN_OPTIONS.contains(key))
        .collect();

    if unknown.is_empty() {
        return Ok(());
    }

    unknown.sort_unstable();
    Err(VolumeError::validation(format!(
        "unknown option(s): {}",
        unknown.join(", ")
    )))
}

/// Caller options may not override the ones the registry always sets.
fn validate_mount_options(extra: &str) -> Result<(), VolumeError> {
    let reserved: Vec<&str> = extra
        .split(',')
        .map(|opt| opt.split_once('=').map_or(opt, |(key, _)| key).trim())
        .filter(|key| RESERVED_MOUNT_OPTIONS.contains(key))
        .collect();

    if reserved.is_empty() {
        return Ok(());
    }

    Err(VolumeError::validation(format!(
        "{OPT_MOUNT_OPTIONS} cannot set {}",
        reserved.join(", ")
    )))
}

fn required_option<'a>(
    options: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, VolumeError> {
    match options.get(key) {
        None => Err(VolumeError::validation(format!(
            "{key} option is mandatory"
        ))),
        Some(value) if value.trim().is_empty() => {
            Err(VolumeError::validation(format!("{key} cannot be empty")))
        }
        Some(value) => Ok(value.as_str()),
    }
}

/// `nolock` and the resolved address always come first.
pub fn mount_options(record: &VolumeRecord) -> String {
    let mut opts = vec!["nolock".to_string(), format!("addr={}", record.server)];
    if let Some(extra) = record.options.as_deref() {
        opts.push(extra.to_string());
    }
    opts.join(",")
}
