//! Session handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CompletionDto, ExtendSessionRequest, PollDto, SessionDto, StartSessionRequest,
};
use crate::application::services::{ExpiryMonitor, SessionManager};
use crate::domain::session::{PaymentMethod, Session};
use crate::interfaces::http::common::{
    api_error, ok, unprocessable, ApiError, ApiResponse, ApiResult, ValidatedJson,
};

#[derive(Clone)]
pub struct SessionState {
    pub sessions: Arc<SessionManager>,
    pub monitor: Arc<ExpiryMonitor>,
}

impl SessionState {
    fn dto(&self, session: Session) -> SessionDto {
        SessionDto::now(session, self.sessions.billing().currency())
    }
}

fn parse_method(raw: &str) -> Result<PaymentMethod, ApiError> {
    PaymentMethod::from_str(raw).ok_or_else(|| {
        unprocessable(format!(
            "payment_method: unknown method '{}', expected cash, apple_pay or knet",
            raw
        ))
    })
}

/// `POST /api/v1/sessions`
pub async fn start_session(
    State(state): State<SessionState>,
    ValidatedJson(req): ValidatedJson<StartSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionDto>>), ApiError> {
    let method = parse_method(&req.payment_method)?;
    let session = state
        .sessions
        .start(req.user_id, req.pc_id, req.duration_minutes, method)
        .await
        .map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(state.dto(session))),
    ))
}

/// `GET /api/v1/sessions`: live sessions, soonest-ending first.
pub async fn list_sessions(State(state): State<SessionState>) -> ApiResult<Vec<SessionDto>> {
    let sessions = state.sessions.live_sessions().await.map_err(api_error)?;
    ok(sessions.into_iter().map(|s| state.dto(s)).collect())
}

/// `GET /api/v1/sessions/{id}`
pub async fn get_session(
    State(state): State<SessionState>,
    Path(id): Path<i32>,
) -> ApiResult<SessionDto> {
    let session = state.sessions.get(id).await.map_err(api_error)?;
    ok(state.dto(session))
}

/// `POST /api/v1/sessions/{id}/extend`
pub async fn extend_session(
    State(state): State<SessionState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<ExtendSessionRequest>,
) -> ApiResult<SessionDto> {
    let method = parse_method(&req.payment_method)?;
    let session = state
        .sessions
        .extend(id, req.extra_minutes, method)
        .await
        .map_err(api_error)?;
    ok(state.dto(session))
}

/// `POST /api/v1/sessions/{id}/pause`
pub async fn pause_session(
    State(state): State<SessionState>,
    Path(id): Path<i32>,
) -> ApiResult<SessionDto> {
    let session = state.sessions.pause(id).await.map_err(api_error)?;
    ok(state.dto(session))
}

/// `POST /api/v1/sessions/{id}/resume`
pub async fn resume_session(
    State(state): State<SessionState>,
    Path(id): Path<i32>,
) -> ApiResult<SessionDto> {
    let session = state.sessions.resume(id).await.map_err(api_error)?;
    ok(state.dto(session))
}

/// `POST /api/v1/sessions/{id}/terminate`
pub async fn terminate_session(
    State(state): State<SessionState>,
    Path(id): Path<i32>,
) -> ApiResult<SessionDto> {
    let session = state.sessions.terminate(id).await.map_err(api_error)?;
    ok(state.dto(session))
}

/// `POST /api/v1/sessions/{id}/complete`: idempotent.
pub async fn complete_session(
    State(state): State<SessionState>,
    Path(id): Path<i32>,
) -> ApiResult<CompletionDto> {
    let completion = state.sessions.complete(id).await.map_err(api_error)?;
    ok(CompletionDto::new(
        completion,
        state.sessions.billing().currency(),
    ))
}

/// `GET /api/v1/sessions/{id}/poll`: countdown tick for kiosk views.
/// Completes the session when time is up.
pub async fn poll_session(
    State(state): State<SessionState>,
    Path(id): Path<i32>,
) -> ApiResult<PollDto> {
    let outcome = state.monitor.poll(id).await.map_err(api_error)?;
    ok(PollDto::new(outcome, state.sessions.billing().currency()))
}
