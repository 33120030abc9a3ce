//! Order and menu handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    AdvanceOrderRequest, CancelOrderParams, MenuEntryDto, MenuItemDto, OrderDto, OrderLinesRequest,
    UpdateMenuItemRequest,
};
use crate::application::services::OrderWorkflow;
use crate::domain::order::OrderStatus;
use crate::interfaces::http::common::{
    api_error, ok, unprocessable, ApiError, ApiResponse, ApiResult, ValidatedJson,
};

#[derive(Clone)]
pub struct OrderState {
    pub orders: Arc<OrderWorkflow>,
}

/// `GET /api/v1/menu`
pub async fn get_menu(State(state): State<OrderState>) -> ApiResult<Vec<MenuEntryDto>> {
    let menu = state.orders.menu().await.map_err(api_error)?;
    ok(menu.into_iter().map(MenuEntryDto::from).collect())
}

/// `PATCH /api/v1/menu/{id}`
pub async fn update_menu_item(
    State(state): State<OrderState>,
    Path(item_id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateMenuItemRequest>,
) -> ApiResult<MenuItemDto> {
    let item = state
        .orders
        .update_menu_item(item_id, req.price, req.available)
        .await
        .map_err(api_error)?;
    ok(item.into())
}

/// `POST /api/v1/sessions/{id}/orders`
pub async fn create_order(
    State(state): State<OrderState>,
    Path(session_id): Path<i32>,
    ValidatedJson(req): ValidatedJson<OrderLinesRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDto>>), ApiError> {
    let order = state
        .orders
        .create(session_id, req.into_requests())
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order.into()))))
}

/// `GET /api/v1/sessions/{id}/orders`
pub async fn list_session_orders(
    State(state): State<OrderState>,
    Path(session_id): Path<i32>,
) -> ApiResult<Vec<OrderDto>> {
    let orders = state
        .orders
        .orders_for_session(session_id)
        .await
        .map_err(api_error)?;
    ok(orders.into_iter().map(OrderDto::from).collect())
}

/// `GET /api/v1/orders/pending`: staff fulfilment queue, oldest first.
pub async fn pending_orders(State(state): State<OrderState>) -> ApiResult<Vec<OrderDto>> {
    let orders = state.orders.pending_orders().await.map_err(api_error)?;
    ok(orders.into_iter().map(OrderDto::from).collect())
}

/// `GET /api/v1/orders/{id}`
pub async fn get_order(State(state): State<OrderState>, Path(id): Path<i32>) -> ApiResult<OrderDto> {
    ok(state.orders.get(id).await.map_err(api_error)?.into())
}

/// `POST /api/v1/orders/{id}/advance`
pub async fn advance_order(
    State(state): State<OrderState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<AdvanceOrderRequest>,
) -> ApiResult<OrderDto> {
    let target = OrderStatus::from_str(&req.status.to_lowercase())
        .ok_or_else(|| unprocessable(format!("status: unknown order status '{}'", req.status)))?;
    let order = state.orders.advance(id, target).await.map_err(api_error)?;
    ok(order.into())
}

/// `POST /api/v1/orders/{id}/cancel[?session_id=N]`. With `session_id` the
/// customer rule applies: own order, still pending.
pub async fn cancel_order(
    State(state): State<OrderState>,
    Path(id): Path<i32>,
    Query(params): Query<CancelOrderParams>,
) -> ApiResult<OrderDto> {
    let order = match params.session_id {
        Some(session_id) => state.orders.cancel_for_session(id, session_id).await,
        None => state.orders.cancel(id).await,
    }
    .map_err(api_error)?;
    ok(order.into())
}

/// `PUT /api/v1/orders/{id}/items`
pub async fn replace_order_items(
    State(state): State<OrderState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<OrderLinesRequest>,
) -> ApiResult<OrderDto> {
    let order = state
        .orders
        .replace_items(id, req.into_requests())
        .await
        .map_err(api_error)?;
    ok(order.into())
}
