// SPDX-License-Identifier: GPL-3.0-only

//! NFS Volume Plugin - Docker volume driver daemon
//!
//! Serves the Docker volume plugin API on a Unix socket and mounts NFS
//! exports on behalf of containers.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use nfsvol_service::config::{Args, Config};
use nfsvol_service::{logging, open_registry, server};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load(Args::parse())?;
    logging::init(config.log_level);

    tracing::info!("Starting NFS volume plugin v{}", env!("CARGO_PKG_VERSION"));

    // Mounting needs CAP_SYS_ADMIN
    if unsafe { libc::geteuid() } != 0 {
        tracing::error!("NFS volume plugin must run as root");
        anyhow::bail!("Plugin must run with root privileges");
    }

    tracing::info!(
        "Mount root {}, state file {}, reconcile {:?}, policy {:?}",
        config.mount_root.display(),
        config.state_file.display(),
        config.reconcile,
        config.policy
    );

    let registry = Arc::new(open_registry(&config)?);

    server::run(registry, &config.socket, config.listen).await?;

    tracing::info!("NFS volume plugin shutting down");
    Ok(())
}
