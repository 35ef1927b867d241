// SPDX-License-Identifier: GPL-3.0-only

//! Kernel NFS mounts
//!
//! Mounts go straight through `mount(2)` with a text option string, the
//! same way `mount.nfs` hands them to the kernel once the server address
//! is known. No helper binary is involved.

use std::net::IpAddr;
use std::path::Path;

use nfsvol_contracts::{MountBackend, MountParams, VolumeError};
use nix::errno::Errno;
use nix::mount::{MntFlags, MsFlags, mount, umount2};
use tracing::{info, warn};

use crate::error::SysError;

pub const NFS_FS_TYPE: &str = "nfs";

/// Build the `server:/export` device string, bracketing IPv6 literals.
pub fn mount_source(server: &str, export_path: &str) -> String {
    match server.parse::<IpAddr>() {
        Ok(IpAddr::V6(_)) => format!("[{}]:{}", server, export_path),
        _ => format!("{}:{}", server, export_path),
    }
}

/// Mount backend that calls the kernel directly
#[derive(Debug, Clone, Copy, Default)]
pub struct NfsMountBackend;

impl MountBackend for NfsMountBackend {
    fn mount(&self, params: &MountParams) -> Result<(), VolumeError> {
        let source = mount_source(&params.server, &params.export_path);
        info!(
            "Mounting {} at {:?} with options {}",
            source, params.target, params.options
        );

        mount(
            Some(source.as_str()),
            params.target.as_path(),
            Some(NFS_FS_TYPE),
            MsFlags::empty(),
            Some(params.options.as_str()),
        )
        .map_err(|errno| {
            warn!("mount {} failed: {}", source, errno);
            SysError::MountFailed {
                device: source.clone(),
                target: params.target.clone(),
                errno,
            }
        })?;

        info!("Successfully mounted {} at {:?}", source, params.target);
        Ok(())
    }

    fn unmount(&self, target: &Path) -> Result<(), VolumeError> {
        info!("Unmounting {:?}", target);

        unmount_outcome(target, umount2(target, MntFlags::empty()))?;
        Ok(())
    }
}

/// `EINVAL` from `umount2` without flags means nothing is mounted at
/// `target` any more, which is the state the caller asked for.
fn unmount_outcome(target: &Path, result: nix::Result<()>) -> crate::error::Result<()> {
    match result {
        Ok(()) => {
            info!("Successfully unmounted {:?}", target);
            Ok(())
        }
        Err(Errno::EINVAL) => {
            warn!("{:?} was not mounted, treating it as unmounted", target);
            Ok(())
        }
        Err(errno) => {
            warn!("umount {:?} failed: {}", target, errno);
            Err(SysError::UnmountFailed {
                target: target.to_path_buf(),
                errno,
            })
        }
    }
}
