// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::net::SocketAddr;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, UnixListener};
use tracing::{info, warn};

use crate::handlers;
use crate::registry::VolumeRegistry;

/// Serve the plugin API until SIGINT or SIGTERM.
///
/// Listens on `listen` when given, otherwise on the Unix socket at `socket`.
pub async fn run(
    registry: Arc<VolumeRegistry>,
    socket: &Path,
    listen: Option<SocketAddr>,
) -> Result<()> {
    let app = handlers::router(registry);

    if let Some(addr) = listen {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {addr}"))?;
        info!(addr = %addr, "Listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;
        return Ok(());
    }

    let listener = bind_unix(socket)?;
    info!(socket = %socket.display(), "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    if let Err(e) = fs::remove_file(socket) {
        warn!("Failed to remove socket {}: {}", socket.display(), e);
    }
    served
}

/// Bind `path`, replacing a stale socket left by an earlier run.
pub fn bind_unix(path: &Path) -> Result<UnixListener> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_socket() => {
            info!("Removing stale socket {}", path.display());
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove stale socket {}", path.display()))?;
        }
        Ok(_) => anyhow::bail!("{} exists and is not a socket", path.display()),
        Err(_) => {}
    }

    let listener = UnixListener::bind(path)
        .with_context(|| format!("Failed to bind socket {}", path.display()))?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o660))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    Ok(listener)
}

async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            info!("Received SIGINT");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replaces_stale_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run/plugin.sock");

        let first = bind_unix(&path).unwrap();
        drop(first);
        assert!(path.exists());

        let _second = bind_unix(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o660);
    }

    #[tokio::test]
    async fn refuses_to_clobber_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin.sock");
        fs::write(&path, b"not a socket").unwrap();

        assert!(bind_unix(&path).is_err());
        assert!(path.is_file());
    }
}
