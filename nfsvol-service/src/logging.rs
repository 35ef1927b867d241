// SPDX-License-Identifier: GPL-3.0-only

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LogLevel;

/// Log to stderr; `RUST_LOG` overrides the configured level.
pub fn init(level: LogLevel) {
    let directive = level.as_directive();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "nfsvol_service={directive},nfsvol_sys={directive},nfs_volume_plugin={directive},warn"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
