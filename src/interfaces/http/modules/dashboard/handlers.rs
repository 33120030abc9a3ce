use std::sync::Arc;

use axum::extract::State;

use crate::application::services::{DashboardService, DashboardSnapshot};
use crate::interfaces::http::common::{api_error, ok, ApiResult};

#[derive(Clone)]
pub struct DashboardState {
    pub dashboard: Arc<DashboardService>,
}

/// `GET /api/v1/dashboard`
pub async fn get_dashboard(State(state): State<DashboardState>) -> ApiResult<DashboardSnapshot> {
    ok(state.dashboard.snapshot().await.map_err(api_error)?)
}
