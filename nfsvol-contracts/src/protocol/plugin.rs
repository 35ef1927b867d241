// SPDX-License-Identifier: GPL-3.0-only

//! Docker volume plugin wire types
//!
//! Field names follow the plugin API casing (`Name`, `Opts`, `Mountpoint`,
//! `Err`). Request bodies tolerate missing fields so that an empty body
//! decodes to the default value.

use std::collections::HashMap;

use nfsvol_types::{Capability, VolumeSummary};
use serde::{Deserialize, Serialize};

pub const CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1+json";
pub const VOLUME_DRIVER: &str = "VolumeDriver";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub opts: Option<HashMap<String, String>>,
}

/// Body of Path and Get
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameRequest {
    #[serde(default)]
    pub name: String,
}

/// Body of Remove.
///
/// `Force` is not sent by Docker itself; operators set it to drop a volume
/// the strict policy would otherwise keep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoveRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub force: bool,
}

/// Body of Mount and Unmount
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountRequest {
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Caller identifier; logged only, holders are counted not tracked
    #[serde(rename = "ID", default)]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    pub implements: Vec<String>,
}

impl Default for ActivateResponse {
    fn default() -> Self {
        Self {
            implements: vec![VOLUME_DRIVER.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Err")]
    pub err: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyResponse {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountpointResponse {
    pub mountpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeInfo {
    pub name: String,
    pub mountpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HashMap<String, serde_json::Value>>,
}

impl From<VolumeSummary> for VolumeInfo {
    fn from(summary: VolumeSummary) -> Self {
        Self {
            name: summary.name,
            mountpoint: summary.mount_point.display().to_string(),
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetResponse {
    pub volume: VolumeInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResponse {
    pub volumes: Vec<VolumeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    pub capabilities: Capability,
}
