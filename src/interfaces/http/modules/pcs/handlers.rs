//! PC handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::dto::{PcDto, RegisterPcRequest};
use crate::application::services::{ResourcePool, SessionManager};
use crate::interfaces::http::common::{api_error, ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::sessions::SessionDto;

#[derive(Clone)]
pub struct PcState {
    pub pool: Arc<ResourcePool>,
    pub sessions: Arc<SessionManager>,
}

/// `GET /api/v1/pcs`
pub async fn list_pcs(State(state): State<PcState>) -> ApiResult<Vec<PcDto>> {
    let pcs = state.pool.list_all().await.map_err(api_error)?;
    ok(pcs.into_iter().map(PcDto::from).collect())
}

/// `GET /api/v1/pcs/available`
pub async fn list_available_pcs(State(state): State<PcState>) -> ApiResult<Vec<PcDto>> {
    let pcs = state.pool.list_available().await.map_err(api_error)?;
    ok(pcs.into_iter().map(PcDto::from).collect())
}

/// `GET /api/v1/pcs/{id}`
pub async fn get_pc(State(state): State<PcState>, Path(id): Path<i32>) -> ApiResult<PcDto> {
    ok(state.pool.find(id).await.map_err(api_error)?.into())
}

/// `POST /api/v1/pcs`
pub async fn register_pc(
    State(state): State<PcState>,
    ValidatedJson(req): ValidatedJson<RegisterPcRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PcDto>>), ApiError> {
    let pc = state
        .pool
        .register(req.number, req.specs)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(pc.into()))))
}

/// `POST /api/v1/pcs/{id}/maintenance`
pub async fn set_maintenance(State(state): State<PcState>, Path(id): Path<i32>) -> ApiResult<PcDto> {
    ok(state.pool.set_maintenance(id).await.map_err(api_error)?.into())
}

/// `DELETE /api/v1/pcs/{id}/maintenance`
pub async fn clear_maintenance(
    State(state): State<PcState>,
    Path(id): Path<i32>,
) -> ApiResult<PcDto> {
    ok(state.pool.clear_maintenance(id).await.map_err(api_error)?.into())
}

/// `GET /api/v1/pcs/{id}/session`: the live session on this PC, or `null`.
pub async fn get_pc_session(
    State(state): State<PcState>,
    Path(id): Path<i32>,
) -> ApiResult<Option<SessionDto>> {
    state.pool.find(id).await.map_err(api_error)?;
    let session = state
        .sessions
        .active_session_for_pc(id)
        .await
        .map_err(api_error)?;
    let currency = state.sessions.billing().currency();
    ok(session.map(|s| SessionDto::now(s, currency)))
}
