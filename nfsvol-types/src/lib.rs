// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for NFS volume management
//!
//! These types are shared by every crate in the workspace:
//!
//! - **nfsvol-sys**: persists `VolumeRecord`s and probes their mount points
//! - **nfsvol-service**: owns the registry of records and answers plugin requests
//! - **nfsvol-testing**: builds fixtures from the same models
//!
//! Mount points are never supplied by callers. They are derived from the
//! volume name through [`MountLayout`], which only accepts names that pass
//! [`validate_volume_name`].

pub mod capability;
pub mod layout;
pub mod volume;

pub use capability::{Capability, Scope};
pub use layout::{DEFAULT_MOUNT_ROOT, MountLayout, NameError, validate_volume_name};
pub use volume::{VolumeRecord, VolumeSummary};
