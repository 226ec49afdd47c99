//! HTTP request handlers for the review API.
//!
//! Every mutating endpoint goes through [`ReviewService`]; the reviewer is
//! identified by the `x-reviewer-id` header.

use crate::ws::notifications_socket;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use reviewdesk_domain::api::{
    ApproveRequest, BatchApproveRequest, BatchRejectRequest, BatchResult, CreateRecordRequest,
    EditRequest, ErrorBody, ExportManifest, ExportRequest, NotificationStatus, RecordPage,
    RejectRequest, StatsResponse, REVIEWER_HEADER,
};
use reviewdesk_domain::traits::RecordQuery;
use reviewdesk_domain::{AuditEntry, ExtractionRecord, RecordId, SourceDocument};
use reviewdesk_hub::NotificationHub;
use reviewdesk_store::SqliteStore;
use reviewdesk_workflow::{ReviewService, WorkflowError, WorkflowMetrics};
use serde::Serialize;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Review workflow over the SQLite store, publishing into `hub`
    pub service: ReviewService<SqliteStore>,
    /// Live notification hub
    pub hub: NotificationHub,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Live WebSocket connections
    pub active_connections: usize,
    /// Workflow counters
    pub metrics: WorkflowMetrics,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Workflow failure, mapped by kind
    Workflow(WorkflowError),
    /// Malformed request input
    BadRequest(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Workflow(e) => {
                let status = match e {
                    WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
                    WorkflowError::InvalidTransition { .. } | WorkflowError::Conflict { .. } => {
                        StatusCode::CONFLICT
                    }
                    WorkflowError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match self {
            AppError::Workflow(e) => e.to_string(),
            AppError::BadRequest(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!(code, "{}", message);
        } else {
            tracing::debug!(code, status = status.as_u16(), "{}", message);
        }

        let body = Json(ErrorBody {
            error: message,
            code: code.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        AppError::Workflow(e)
    }
}

fn parse_id(raw: &str) -> Result<RecordId, AppError> {
    RecordId::from_string(raw).map_err(AppError::BadRequest)
}

fn reviewer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REVIEWER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// GET /health - Liveness plus workflow counters
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_connections: state.hub.connection_count(),
        metrics: state.service.metrics(),
    })
}

/// GET /api/v1/records - List records, newest first
async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<RecordPage>, AppError> {
    Ok(Json(state.service.list_records(&query)?))
}

/// POST /api/v1/records - Register a freshly extracted record
async fn create_record(
    State(state): State<AppState>,
    Json(request): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<ExtractionRecord>), AppError> {
    let source = SourceDocument {
        source_file: request.source_file,
        record_type: request.record_type,
    };
    let record =
        state
            .service
            .create_record(source, request.extracted_data, request.confidence_score)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/records/stats - Aggregate counts
async fn record_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    Ok(Json(StatsResponse::from(state.service.stats()?)))
}

/// GET /api/v1/records/:id
async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExtractionRecord>, AppError> {
    Ok(Json(state.service.get_record(parse_id(&id)?)?))
}

/// PUT /api/v1/records/:id - Edit the payload
async fn edit_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<EditRequest>,
) -> Result<Json<ExtractionRecord>, AppError> {
    let id = parse_id(&id)?;
    let actor = reviewer(&headers);
    let record = state
        .service
        .edit(id, request.data, request.notes, actor.as_deref())?;
    Ok(Json(record))
}

/// GET /api/v1/records/:id/audit - Full review history
async fn audit_trail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    Ok(Json(state.service.audit_trail(parse_id(&id)?)?))
}

/// POST /api/v1/records/:id/approve
async fn approve_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<ExtractionRecord>, AppError> {
    let id = parse_id(&id)?;
    let actor = reviewer(&headers);
    let notes = body.and_then(|Json(b)| b.notes);
    Ok(Json(state.service.approve(id, notes, actor.as_deref())?))
}

/// POST /api/v1/records/:id/reject
async fn reject_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<RejectRequest>>,
) -> Result<Json<ExtractionRecord>, AppError> {
    let id = parse_id(&id)?;
    let actor = reviewer(&headers);
    let reason = body.map(|Json(b)| b.reason).unwrap_or_default();
    Ok(Json(state.service.reject(id, reason, actor.as_deref())?))
}

/// POST /api/v1/records/approve-batch
async fn approve_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BatchApproveRequest>,
) -> Result<Json<BatchResult>, AppError> {
    let actor = reviewer(&headers);
    let result = state
        .service
        .approve_batch(&request.record_ids, request.notes, actor.as_deref())?;
    Ok(Json(result))
}

/// POST /api/v1/records/reject-batch
async fn reject_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BatchRejectRequest>,
) -> Result<Json<BatchResult>, AppError> {
    let actor = reviewer(&headers);
    let result = state
        .service
        .reject_batch(&request.record_ids, request.reason, actor.as_deref())?;
    Ok(Json(result))
}

/// POST /api/v1/records/export - Select records and mark approved ones exported
async fn export_records(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportManifest>, AppError> {
    let actor = reviewer(&headers);
    Ok(Json(state.service.export(&request, actor.as_deref())?))
}

/// GET /api/v1/notifications/status - Hub counters
async fn notification_status(State(state): State<AppState>) -> Json<NotificationStatus> {
    let stats = state.hub.stats();
    Json(NotificationStatus {
        status: "active".to_string(),
        active_connections: stats.active_connections,
        published: stats.published,
        delivered: stats.delivered,
        dropped: stats.dropped,
        reaped: stats.reaped,
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/api/v1/records", get(list_records).post(create_record))
        .route("/api/v1/records/stats", get(record_stats))
        .route("/api/v1/records/approve-batch", post(approve_batch))
        .route("/api/v1/records/reject-batch", post(reject_batch))
        .route("/api/v1/records/export", post(export_records))
        .route("/api/v1/records/:id", get(get_record).put(edit_record))
        .route("/api/v1/records/:id/audit", get(audit_trail))
        .route("/api/v1/records/:id/approve", post(approve_record))
        .route("/api/v1/records/:id/reject", post(reject_record))
        .route("/api/v1/notifications/status", get(notification_status))
        .route("/ws/notifications", get(notifications_socket))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use reviewdesk_domain::RecordStatus;
    use std::sync::Arc;
    use tower::ServiceExt; // for oneshot

    fn create_test_state() -> AppState {
        let hub = NotificationHub::default();
        let store = SqliteStore::new(":memory:").unwrap();
        let service = ReviewService::new(store, Arc::new(hub.clone()));
        AppState { service, hub }
    }

    #[test]
    fn test_error_status_mapping() {
        let id = RecordId::new();
        let cases = [
            (WorkflowError::NotFound(id), StatusCode::NOT_FOUND),
            (
                WorkflowError::Conflict {
                    id,
                    expected: RecordStatus::Pending,
                    actual: RecordStatus::Approved,
                },
                StatusCode::CONFLICT,
            ),
            (
                WorkflowError::ValidationFailed("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                WorkflowError::Store("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status_and_code().0, expected);
        }
    }

    #[test]
    fn test_reviewer_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(reviewer(&headers), None);

        headers.insert(REVIEWER_HEADER, "  maria ".parse().unwrap());
        assert_eq!(reviewer(&headers), Some("maria".to_string()));

        headers.insert(REVIEWER_HEADER, "".parse().unwrap());
        assert_eq!(reviewer(&headers), None);
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_id_is_bad_request() {
        let app = create_router(create_test_state());

        let request = Request::builder()
            .uri("/api/v1/records/not-an-id")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
