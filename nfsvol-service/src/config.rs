// SPDX-License-Identifier: GPL-3.0-only

//! Daemon configuration
//!
//! Values come from three layers: built-in defaults, an optional TOML file
//! and command line flags. Flags win over the file, the file wins over the
//! defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use nfsvol_sys::state::DEFAULT_STATE_FILE;
use nfsvol_types::DEFAULT_MOUNT_ROOT;
use serde::Deserialize;

use crate::registry::RegistryPolicy;

pub const DEFAULT_SOCKET: &str = "/run/docker/plugins/nfs.sock";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Every stored volume starts with zero holders
    #[default]
    Reset,
    /// Volumes still mounted according to the kernel start with one holder
    Probe,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Default, Parser)]
#[command(name = "nfs-volume-plugin", version, about = "Docker volume plugin for NFS exports")]
pub struct Args {
    /// TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Unix socket the plugin API listens on
    #[arg(long)]
    pub socket: Option<PathBuf>,

    /// Listen on TCP instead of the Unix socket
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Directory holding the per-volume mount points
    #[arg(long)]
    pub mount_root: Option<PathBuf>,

    /// File the volume table is persisted to
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub reconcile: Option<ReconcileMode>,

    /// Refuse to remove mounted volumes and keep counts after failed unmounts
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}

/// On-disk configuration; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub socket: Option<PathBuf>,
    pub listen: Option<SocketAddr>,
    pub mount_root: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub reconcile: Option<ReconcileMode>,
    pub strict: Option<bool>,
    pub log_level: Option<LogLevel>,
}

impl FileConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub socket: PathBuf,
    pub listen: Option<SocketAddr>,
    pub mount_root: PathBuf,
    pub state_file: PathBuf,
    pub reconcile: ReconcileMode,
    pub policy: RegistryPolicy,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self::merge(Args::default(), FileConfig::default())
    }
}

impl Config {
    /// Read the file named by `--config`, if any, and merge it with `args`.
    pub fn load(args: Args) -> anyhow::Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(args, file))
    }

    pub fn merge(args: Args, file: FileConfig) -> Self {
        let strict = args.strict || file.strict.unwrap_or(false);

        Self {
            socket: args
                .socket
                .or(file.socket)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET)),
            listen: args.listen.or(file.listen),
            mount_root: args
                .mount_root
                .or(file.mount_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MOUNT_ROOT)),
            state_file: args
                .state_file
                .or(file.state_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            reconcile: args.reconcile.or(file.reconcile).unwrap_or_default(),
            policy: if strict {
                RegistryPolicy::strict()
            } else {
                RegistryPolicy::default()
            },
            log_level: args.log_level.or(file.log_level).unwrap_or_default(),
        }
    }
}
