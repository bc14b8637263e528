//! HTTP surface of the Distribution Service
//!
//! ```text
//! GET /v1/updates/manifest.json?channel=&current_version=
//! GET /v1/updates/channels
//! GET /v1/updates/health
//! GET /v1/updates/stats
//! GET /v1/updates/download/{*path}?channel=
//! ```

use crate::service::DistributionService;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use updraft_core::Error;

/// Route prefix for every endpoint
pub const API_PREFIX: &str = "/v1/updates";

type AppState = Arc<DistributionService>;

/// Service error rendered as `{"error": "..."}` with a mapped status
#[derive(Debug)]
pub struct ApiError(Error);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidChannel { .. } | Error::Input { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Integrity { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self.0 {
            Error::NotFound { .. } | Error::InvalidChannel { .. } | Error::Input { .. } => {
                self.0.to_string()
            }
            Error::Integrity { path, .. } => format!("Integrity check failed for {}", path),
            other => {
                error!("Request failed: {}", other);
                "Internal server error".to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ManifestQuery {
    channel: Option<String>,
    current_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    channel: Option<String>,
}

/// Build the router for a service instance.
pub fn router(service: Arc<DistributionService>) -> Router {
    let api = Router::new()
        .route("/manifest.json", get(get_manifest))
        .route("/channels", get(list_channels))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/download/{*path}", get(download));

    Router::new().nest(API_PREFIX, api).with_state(service)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    service: Arc<DistributionService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Update server listening on http://{}{}", addr, API_PREFIX);
    }
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn get_manifest(
    State(service): State<AppState>,
    Query(query): Query<ManifestQuery>,
) -> Result<Response, ApiError> {
    let raw = tokio::task::spawn_blocking(move || {
        service.get_manifest(
            query.channel.as_deref().unwrap_or("stable"),
            query.current_version.as_deref(),
        )
    })
    .await
    .map_err(|e| Error::store("manifest", e.to_string()))??;

    Ok(([(header::CONTENT_TYPE, "application/json")], raw).into_response())
}

async fn list_channels(State(service): State<AppState>) -> Result<Response, ApiError> {
    let channels = tokio::task::spawn_blocking(move || service.list_channels())
        .await
        .map_err(|e| Error::store("channels", e.to_string()))?;
    Ok(Json(json!({ "channels": channels })).into_response())
}

async fn health(State(service): State<AppState>) -> Response {
    Json(service.health()).into_response()
}

async fn stats(State(service): State<AppState>) -> Response {
    Json(service.stats_snapshot()).into_response()
}

async fn download(
    State(service): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let file = service.download(&path, query.channel.as_deref()).await?;
    let file_name = path
        .rsplit('/')
        .next()
        .unwrap_or(path.as_str())
        .replace('"', "_");

    Ok((
        [
            (header::CONTENT_TYPE, file.mime_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        file.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::from(Error::invalid_channel("nightly")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::not_found("manifest")).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(Error::integrity("index.html", "hash mismatch")).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(Error::store("3.5.1/index.html", "disk")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
