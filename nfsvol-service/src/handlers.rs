// SPDX-License-Identifier: GPL-3.0-only

//! Docker volume plugin endpoints
//!
//! Every endpoint is a `POST` with a JSON body. Registry calls block, so
//! each handler hands its work to the blocking pool.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use nfsvol_contracts::protocol::plugin::{
    ActivateResponse, CapabilitiesResponse, CreateRequest, EmptyResponse, GetResponse,
    ListResponse, MountRequest, MountpointResponse, NameRequest, RemoveRequest, VolumeInfo,
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{PluginJson, Result, ServiceError};
use crate::registry::VolumeRegistry;

type SharedRegistry = Arc<VolumeRegistry>;

pub fn router(registry: SharedRegistry) -> Router {
    Router::new()
        .route("/Plugin.Activate", post(activate))
        .route("/VolumeDriver.Create", post(create))
        .route("/VolumeDriver.List", post(list))
        .route("/VolumeDriver.Get", post(get))
        .route("/VolumeDriver.Remove", post(remove))
        .route("/VolumeDriver.Path", post(path))
        .route("/VolumeDriver.Mount", post(mount))
        .route("/VolumeDriver.Unmount", post(unmount))
        .route("/VolumeDriver.Capabilities", post(capabilities))
        .with_state(registry)
}

/// Decode a request body; an empty body means "all defaults".
fn decode<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ServiceError::InvalidBody(e.to_string()))
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> std::result::Result<T, nfsvol_contracts::VolumeError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

async fn activate() -> PluginJson<ActivateResponse> {
    info!("Plugin.Activate");
    PluginJson(ActivateResponse::default())
}

async fn create(
    State(registry): State<SharedRegistry>,
    body: Bytes,
) -> Result<PluginJson<EmptyResponse>> {
    let request: CreateRequest = decode(&body)?;
    info!("VolumeDriver.Create: volume {}", request.name);

    let opts = request.opts.unwrap_or_default();
    blocking(move || registry.create(&request.name, &opts)).await?;
    Ok(PluginJson(EmptyResponse {}))
}

async fn list(State(registry): State<SharedRegistry>) -> Result<PluginJson<ListResponse>> {
    info!("VolumeDriver.List: volumes");

    let volumes = blocking(move || Ok(registry.list())).await?;
    Ok(PluginJson(ListResponse {
        volumes: volumes.into_iter().map(VolumeInfo::from).collect(),
    }))
}

async fn get(
    State(registry): State<SharedRegistry>,
    body: Bytes,
) -> Result<PluginJson<GetResponse>> {
    let request: NameRequest = decode(&body)?;
    info!("VolumeDriver.Get: volume {}", request.name);

    let record = blocking(move || registry.get(&request.name)).await?;
    let refcount = serde_json::Value::from(record.ref_count);
    let mut volume = VolumeInfo::from(record.summary());
    volume.status = Some([("refcount".to_string(), refcount)].into_iter().collect());

    Ok(PluginJson(GetResponse { volume }))
}

async fn remove(
    State(registry): State<SharedRegistry>,
    body: Bytes,
) -> Result<PluginJson<EmptyResponse>> {
    let request: RemoveRequest = decode(&body)?;
    info!(
        "VolumeDriver.Remove: volume {} (force {})",
        request.name, request.force
    );

    blocking(move || {
        if request.force {
            registry.force_remove(&request.name)
        } else {
            registry.remove(&request.name)
        }
    })
    .await?;
    Ok(PluginJson(EmptyResponse {}))
}

async fn path(
    State(registry): State<SharedRegistry>,
    body: Bytes,
) -> Result<PluginJson<MountpointResponse>> {
    let request: NameRequest = decode(&body)?;
    info!("VolumeDriver.Path: volume {}", request.name);

    let mount_point = blocking(move || registry.path(&request.name)).await?;
    Ok(PluginJson(MountpointResponse {
        mountpoint: mount_point.display().to_string(),
    }))
}

async fn mount(
    State(registry): State<SharedRegistry>,
    body: Bytes,
) -> Result<PluginJson<MountpointResponse>> {
    let request: MountRequest = decode(&body)?;
    info!("VolumeDriver.Mount: volume {} (id {})", request.name, request.id);

    let mount_point = blocking(move || registry.mount(&request.name)).await?;
    Ok(PluginJson(MountpointResponse {
        mountpoint: mount_point.display().to_string(),
    }))
}

async fn unmount(
    State(registry): State<SharedRegistry>,
    body: Bytes,
) -> Result<PluginJson<EmptyResponse>> {
    let request: MountRequest = decode(&body)?;
    info!(
        "VolumeDriver.Unmount: volume {} (id {})",
        request.name, request.id
    );

    blocking(move || registry.unmount(&request.name)).await?;
    Ok(PluginJson(EmptyResponse {}))
}

async fn capabilities(State(registry): State<SharedRegistry>) -> PluginJson<CapabilitiesResponse> {
    info!("VolumeDriver.Capabilities");
    PluginJson(CapabilitiesResponse {
        capabilities: registry.capabilities(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_decodes_to_default() {
        let request: NameRequest = decode(&Bytes::from_static(b"  \n")).unwrap();
        assert_eq!(request, NameRequest::default());
    }

    #[test]
    fn malformed_body_is_rejected() {
        let err = decode::<NameRequest>(&Bytes::from_static(b"{\"Name\":")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidBody(_)));
    }
}
