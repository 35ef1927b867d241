// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for NFS volume management
//!
//! This crate provides the OS-facing implementations of the volume
//! contracts:
//! - Server address resolution
//! - NFS mount and unmount through the kernel mount syscalls
//! - Mount point directory creation
//! - Durable JSON snapshots of the volume table
//! - Mount table inspection for startup reconciliation
//!
//! Mounting requires root; only the plugin daemon should call into the
//! mount backend.

pub mod dir;
pub mod error;
pub mod mount;
pub mod mounts;
pub mod resolve;
pub mod state;

pub use dir::ensure_dir;
pub use error::{Result, SysError};
pub use mount::NfsMountBackend;
pub use mounts::{MountEntry, MountTableProbe, parse_mountinfo};
pub use resolve::{DnsResolver, host_lookup, is_valid_fqdn};
pub use state::JsonStateStore;
