// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One named volume backed by a remote NFS export
///
/// `ref_count` lives in memory only. It is skipped on serialization, so a
/// record read back from durable state always starts at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRecord {
    pub name: String,
    /// Address resolved at creation time; never re-resolved on mount
    pub server: String,
    pub export_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub mount_point: PathBuf,
    #[serde(skip)]
    pub ref_count: u32,
}

impl VolumeRecord {
    pub fn new(
        name: impl Into<String>,
        server: impl Into<String>,
        export_path: impl Into<String>,
        options: Option<String>,
        mount_point: PathBuf,
    ) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            export_path: export_path.into(),
            options,
            mount_point,
            ref_count: 0,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.ref_count > 0
    }

    pub fn summary(&self) -> VolumeSummary {
        VolumeSummary {
            name: self.name.clone(),
            mount_point: self.mount_point.clone(),
        }
    }
}

/// Name and mount point of a registered volume, as returned by listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub name: String,
    pub mount_point: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_count_is_not_persisted() {
        let mut record = VolumeRecord::new(
            "data",
            "10.0.0.5",
            "/export/a",
            Some("vers=4".to_string()),
            PathBuf::from("/mnt/volumes/data"),
        );
        record.ref_count = 3;

        let json = serde_json::to_string(&record).expect("serialize record");
        assert!(!json.contains("ref_count"));

        let parsed: VolumeRecord = serde_json::from_str(&json).expect("deserialize record");
        assert_eq!(parsed.ref_count, 0);
        assert_eq!(parsed.server, "10.0.0.5");
        assert_eq!(parsed.options.as_deref(), Some("vers=4"));
    }

    #[test]
    fn options_may_be_absent_in_stored_state() {
        let json = r#"{"name":"a","server":"10.0.0.1","export_path":"/x","mount_point":"/m/a"}"#;
        let parsed: VolumeRecord = serde_json::from_str(json).expect("deserialize record");
        assert_eq!(parsed.options, None);
        assert!(!parsed.is_mounted());
    }
}
