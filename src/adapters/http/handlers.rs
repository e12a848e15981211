//! HTTP handlers for health and archive lookup.

use std::sync::Arc;

use axum::extract::{FromRef, Path, State};
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;

use crate::adapters::websocket::SessionGateway;
use crate::domain::foundation::{ErrorCode, ThreadId, ValidationError};
use crate::ports::{ArchiveError, ArchiveStore};

use super::dto::{ArchivedThreadResponse, ErrorResponse, HealthResponse};

/// Shared state for every relay route.
#[derive(Clone)]
pub struct RelayAppState {
    pub gateway: Arc<SessionGateway>,
    pub archive: Arc<dyn ArchiveStore>,
}

impl FromRef<RelayAppState> for Arc<SessionGateway> {
    fn from_ref(state: &RelayAppState) -> Self {
        state.gateway.clone()
    }
}

/// `GET /health`
pub async fn health(State(state): State<RelayAppState>) -> impl IntoResponse {
    let stats = state.gateway.stats().await;
    Json(HealthResponse {
        status: "ok",
        open_threads: stats.open_threads,
        connected_clients: stats.connected_clients,
    })
}

/// `GET /archive/:thread_id`
///
/// Serves the transcript with student names only.
pub async fn get_archived_thread(
    State(state): State<RelayAppState>,
    Path(thread_id): Path<String>,
) -> Result<impl IntoResponse, ArchiveApiError> {
    let thread_id = ThreadId::parse(&thread_id)?;
    let record = state
        .archive
        .load(&thread_id)
        .await?
        .ok_or(ArchiveApiError::NotFound(thread_id))?;
    Ok(Json(ArchivedThreadResponse::from(record)))
}

/// API error type that converts archive lookups into HTTP responses.
#[derive(Debug)]
pub enum ArchiveApiError {
    InvalidId(ValidationError),
    NotFound(ThreadId),
    Storage(ArchiveError),
}

impl From<ValidationError> for ArchiveApiError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidId(err)
    }
}

impl From<ArchiveError> for ArchiveApiError {
    fn from(err: ArchiveError) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for ArchiveApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            ArchiveApiError::InvalidId(e) => (StatusCode::BAD_REQUEST, e.code(), e.to_string()),
            ArchiveApiError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                ErrorCode::ThreadNotFound,
                format!("No archived thread {}", id),
            ),
            ArchiveApiError::Storage(e) => {
                tracing::error!(error = %e, "Archive lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    e.code(),
                    "Archive unavailable".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse::new(code.to_string(), message))).into_response()
    }
}
