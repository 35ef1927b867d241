// SPDX-License-Identifier: GPL-3.0-only

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use nfsvol_contracts::protocol::plugin::{CONTENT_TYPE, ErrorResponse};
use nfsvol_contracts::{VolumeError, VolumeErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Request-level failures of the plugin API
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Volume(#[from] VolumeError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Task join error: {0}")]
    Join(String),
}

impl ServiceError {
    pub fn kind(&self) -> VolumeErrorKind {
        match self {
            ServiceError::Volume(err) => err.kind(),
            ServiceError::InvalidBody(_) => VolumeErrorKind::Validation,
            ServiceError::Join(_) => VolumeErrorKind::Io,
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Join(err.to_string())
    }
}

/// Only the message reaches the orchestrator, as `{"Err": "..."}`.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        tracing::warn!("Request failed ({}): {}", self.kind(), self);
        let body = ErrorResponse {
            err: self.to_string(),
        };
        let mut response = PluginJson(body).into_response();
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    }
}

/// JSON body with the plugin content type
pub struct PluginJson<T>(pub T);

impl<T: Serialize> IntoResponse for PluginJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
            Err(e) => ServiceError::Volume(VolumeError::io(format!(
                "Failed to encode response: {e}"
            )))
            .into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
