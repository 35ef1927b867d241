// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use nfsvol_contracts::protocol::plugin::CONTENT_TYPE;
use nfsvol_service::handlers;
use nfsvol_service::registry::{Collaborators, RegistryPolicy, VolumeRegistry};
use nfsvol_testing::{MemoryStateStore, RecordingMountBackend, StaticResolver};
use nfsvol_types::MountLayout;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct Plugin {
    app: Router,
    backend: Arc<RecordingMountBackend>,
    root: TempDir,
}

impl Plugin {
    fn new() -> Self {
        Self::with_policy(RegistryPolicy::default())
    }

    fn with_policy(policy: RegistryPolicy) -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let backend = Arc::new(RecordingMountBackend::new());
        let registry = VolumeRegistry::new(
            MountLayout::new(root.path()),
            policy,
            Collaborators {
                backend: backend.clone(),
                store: Arc::new(MemoryStateStore::new()),
                resolver: Arc::new(StaticResolver::new()),
            },
        );

        Self {
            app: handlers::router(Arc::new(registry)),
            backend,
            root,
        }
    }

    fn mount_point(&self, name: &str) -> String {
        self.root.path().join(name).display().to_string()
    }

    async fn call(&self, endpoint: &str, body: impl Into<Body>) -> (StatusCode, String, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(endpoint)
            .body(body.into())
            .expect("build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = serde_json::from_slice(&bytes).expect("JSON body");

        (status, content_type, value)
    }

    async fn post(&self, endpoint: &str, body: Value) -> (StatusCode, Value) {
        let (status, _, value) = self.call(endpoint, body.to_string()).await;
        (status, value)
    }
}

#[tokio::test]
async fn activate_announces_volume_driver() {
    let plugin = Plugin::new();
    let (status, content_type, body) = plugin.call("/Plugin.Activate", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, CONTENT_TYPE);
    assert_eq!(body, json!({ "Implements": ["VolumeDriver"] }));
}

#[tokio::test]
async fn capabilities_accept_an_empty_body() {
    let plugin = Plugin::new();
    let (status, _, body) = plugin
        .call("/VolumeDriver.Capabilities", Body::empty())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Capabilities": { "Scope": "local" } }));
}

#[tokio::test]
async fn list_starts_empty() {
    let plugin = Plugin::new();
    let (status, _, body) = plugin.call("/VolumeDriver.List", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Volumes": [] }));
}

#[tokio::test]
async fn full_volume_lifecycle() {
    let plugin = Plugin::new();
    let mount_point = plugin.mount_point("v1");

    let (status, body) = plugin
        .post(
            "/VolumeDriver.Create",
            json!({ "Name": "v1", "Opts": { "server": "10.0.0.5", "path": "/export/a" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = plugin
        .post("/VolumeDriver.Mount", json!({ "Name": "v1", "ID": "c1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "Mountpoint": mount_point }));

    let (_, body) = plugin
        .post("/VolumeDriver.Path", json!({ "Name": "v1" }))
        .await;
    assert_eq!(body, json!({ "Mountpoint": mount_point }));

    let (_, body) = plugin
        .post("/VolumeDriver.Get", json!({ "Name": "v1" }))
        .await;
    assert_eq!(
        body,
        json!({
            "Volume": {
                "Name": "v1",
                "Mountpoint": mount_point,
                "Status": { "refcount": 1 }
            }
        })
    );

    let (_, body) = plugin.post("/VolumeDriver.List", json!({})).await;
    assert_eq!(
        body,
        json!({ "Volumes": [{ "Name": "v1", "Mountpoint": mount_point }] })
    );

    let (status, body) = plugin
        .post("/VolumeDriver.Unmount", json!({ "Name": "v1", "ID": "c1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = plugin
        .post("/VolumeDriver.Remove", json!({ "Name": "v1" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let mounts = plugin.backend.mounts();
    assert_eq!(mounts.len(), 1);
    assert_eq!(mounts[0].options, "nolock,addr=10.0.0.5");
    assert_eq!(plugin.backend.unmounts().len(), 1);
}

#[tokio::test]
async fn errors_carry_only_a_message() {
    let plugin = Plugin::new();
    let (status, content_type, body) = plugin
        .call("/VolumeDriver.Get", json!({ "Name": "ghost" }).to_string())
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type, CONTENT_TYPE);
    assert_eq!(body, json!({ "Err": "volume ghost not found" }));
}

#[tokio::test]
async fn create_without_server_is_rejected() {
    let plugin = Plugin::new();
    let (status, body) = plugin
        .post(
            "/VolumeDriver.Create",
            json!({ "Name": "v1", "Opts": { "path": "/export/a" } }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "Err": "server option is mandatory" }));

    let (_, body) = plugin.post("/VolumeDriver.List", json!({})).await;
    assert_eq!(body, json!({ "Volumes": [] }));
}

#[tokio::test]
async fn create_without_opts_is_rejected() {
    let plugin = Plugin::new();
    let (status, body) = plugin
        .post("/VolumeDriver.Create", json!({ "Name": "v1" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["Err"].is_string());
}

#[tokio::test]
async fn duplicate_create_reports_conflict() {
    let plugin = Plugin::new();
    let request = json!({ "Name": "v1", "Opts": { "server": "10.0.0.5", "path": "/a" } });

    plugin.post("/VolumeDriver.Create", request.clone()).await;
    let (status, body) = plugin.post("/VolumeDriver.Create", request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "Err": "volume v1 already exists" }));
}

#[tokio::test]
async fn failed_mount_is_reported_and_not_counted() {
    let plugin = Plugin::new();
    plugin
        .post(
            "/VolumeDriver.Create",
            json!({ "Name": "v1", "Opts": { "server": "10.0.0.5", "path": "/a" } }),
        )
        .await;

    plugin.backend.fail_mounts(true);
    let (status, body) = plugin
        .post("/VolumeDriver.Mount", json!({ "Name": "v1", "ID": "c1" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["Err"].as_str().unwrap_or_default().contains("failed"));

    let (_, body) = plugin
        .post("/VolumeDriver.Get", json!({ "Name": "v1" }))
        .await;
    assert_eq!(body["Volume"]["Status"]["refcount"], json!(0));
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let plugin = Plugin::new();
    let (status, _, body) = plugin.call("/VolumeDriver.Mount", "{\"Name\":").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["Err"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Invalid request body")
    );
}

#[tokio::test]
async fn forced_remove_drops_a_held_volume() {
    let plugin = Plugin::with_policy(RegistryPolicy::strict());
    plugin
        .post(
            "/VolumeDriver.Create",
            json!({ "Name": "v1", "Opts": { "server": "10.0.0.5", "path": "/a" } }),
        )
        .await;
    plugin
        .post("/VolumeDriver.Mount", json!({ "Name": "v1", "ID": "c1" }))
        .await;

    let (status, body) = plugin
        .post("/VolumeDriver.Remove", json!({ "Name": "v1" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "Err": "volume v1 is in use by 1 mount(s)" }));

    let (status, body) = plugin
        .post("/VolumeDriver.Remove", json!({ "Name": "v1", "Force": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (_, body) = plugin.post("/VolumeDriver.List", json!({})).await;
    assert_eq!(body, json!({ "Volumes": [] }));
    assert_eq!(plugin.backend.unmounts().len(), 1);
}
