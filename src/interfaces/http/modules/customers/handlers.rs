//! Customer handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use super::dto::{CustomerDto, CustomerLookupQuery, RegisterCustomerRequest};
use crate::application::services::{CustomerService, SessionManager};
use crate::interfaces::http::common::{api_error, ok, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::sessions::SessionDto;

#[derive(Clone)]
pub struct CustomerState {
    pub customers: Arc<CustomerService>,
    pub sessions: Arc<SessionManager>,
}

/// `POST /api/v1/customers`: registers, or returns the customer already
/// registered under the civil id.
pub async fn register_customer(
    State(state): State<CustomerState>,
    ValidatedJson(req): ValidatedJson<RegisterCustomerRequest>,
) -> ApiResult<CustomerDto> {
    let customer = state
        .customers
        .register(&req.name, &req.civil_id, &req.phone)
        .await
        .map_err(api_error)?;
    ok(customer.into())
}

/// `GET /api/v1/customers/lookup?q=`: kiosk sign-in by civil id or phone
pub async fn lookup_customer(
    State(state): State<CustomerState>,
    Query(query): Query<CustomerLookupQuery>,
) -> ApiResult<CustomerDto> {
    ok(state.customers.identify(&query.q).await.map_err(api_error)?.into())
}

/// `GET /api/v1/customers/{id}`
pub async fn get_customer(
    State(state): State<CustomerState>,
    Path(id): Path<i32>,
) -> ApiResult<CustomerDto> {
    ok(state.customers.find(id).await.map_err(api_error)?.into())
}

/// `GET /api/v1/customers/{id}/session`: lets a kiosk resume an in-progress
/// rental after sign-in.
pub async fn get_customer_session(
    State(state): State<CustomerState>,
    Path(id): Path<i32>,
) -> ApiResult<Option<SessionDto>> {
    state.customers.find(id).await.map_err(api_error)?;
    let session = state
        .sessions
        .active_session_for_user(id)
        .await
        .map_err(api_error)?;
    let currency = state.sessions.billing().currency();
    ok(session.map(|s| SessionDto::now(s, currency)))
}
