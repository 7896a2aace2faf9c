use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn};

use protchain_guard_core::{AuthError, Claims, Digest, Guard, GuardError, GuardOutcome, GuardState, IntegrityError};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    guard: Arc<Guard>,
}

impl AppState {
    pub fn new(guard: Guard) -> Self { Self { guard: Arc::new(guard) } }
}

/// Error wrapper mapping verifier failures onto HTTP responses.
#[derive(Debug)]
pub struct ApiError(GuardError);

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self { ApiError(err) }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self { ApiError(err.into()) }
}

impl From<IntegrityError> for ApiError {
    fn from(err: IntegrityError) -> Self { ApiError(err.into()) }
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: status.to_string(), message: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct CommitResponse {
    resource_id: String,
    digest: Digest,
}

#[derive(Serialize)]
struct VerifyResponse {
    resource_id: String,
    status: GuardState,
    subject_id: String,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/session", get(session))
        .route("/api/v1/resources/:id", post(commit_resource).delete(retire_resource))
        .route("/api/v1/resources/:id/verify", post(verify_resource))
        .with_state(state)
}

fn now() -> i64 { chrono::Utc::now().timestamp() }

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    state.guard.authorize(authorization(headers), now()).map_err(|err| {
        warn!(%err, "rejected request");
        ApiError::from(err)
    })
}

async fn health() -> &'static str { "ok" }

async fn session(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Claims>, ApiError> {
    let claims = authorize(&state, &headers)?;
    Ok(Json(claims))
}

async fn commit_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CommitResponse>), ApiError> {
    let claims = authorize(&state, &headers)?;
    let digest = state.guard.integrity().commit(&resource_id, &claims.subject_id, &body)?;
    info!(resource = %resource_id, subject = %claims.subject_id, %digest, "committed reference digest");
    Ok((StatusCode::CREATED, Json(CommitResponse { resource_id, digest })))
}

async fn verify_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<VerifyResponse>), ApiError> {
    let outcome = state.guard.check_resource(authorization(&headers), &resource_id, &body, now());
    let status = outcome.state();
    match outcome {
        GuardOutcome::Verified { claims } => {
            Ok((StatusCode::OK, Json(VerifyResponse { resource_id, status, subject_id: claims.subject_id })))
        }
        GuardOutcome::Tampered { claims, .. } => {
            warn!(resource = %resource_id, subject = %claims.subject_id, "integrity violation");
            Ok((StatusCode::CONFLICT, Json(VerifyResponse { resource_id, status, subject_id: claims.subject_id })))
        }
        GuardOutcome::Rejected(err) => {
            warn!(%err, "rejected request");
            Err(err.into())
        }
        GuardOutcome::Unchecked { error, .. } => Err(error.into()),
    }
}

async fn retire_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let claims = authorize(&state, &headers)?;
    state.guard.integrity().retire(&resource_id, &claims.subject_id).map_err(|err| {
        warn!(resource = %resource_id, subject = %claims.subject_id, %err, "retire refused");
        ApiError::from(err)
    })?;
    info!(resource = %resource_id, subject = %claims.subject_id, "retired reference digest");
    Ok(StatusCode::NO_CONTENT)
}
