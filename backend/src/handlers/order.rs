//! Order workflow HTTP handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{AuthUser, CurrentUser};
use crate::services::order::{CreateOrderInput, OrderDecisionInput, OrderFilter};
use crate::services::OrderService;
use crate::AppState;
use shared::OrderDetails;

/// Response for list of orders
#[derive(Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderDetails>,
}

/// Create a pending order requested by the current user
pub async fn create_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<CreateOrderInput>,
) -> Result<impl IntoResponse, AppError> {
    let service = OrderService::new(state.db.clone());
    let order = service.create(user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders with optional status, medicine and store filters
pub async fn list_orders(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OrderFilter>,
) -> Result<Json<OrdersResponse>, AppError> {
    let service = OrderService::new(state.db.clone());
    let orders = service.list(filter).await?;
    Ok(Json(OrdersResponse { orders }))
}

/// Get a single order
pub async fn get_order(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<Uuid>,
) -> Result<Json<OrderDetails>, AppError> {
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.get(order_id).await?))
}

/// Approve a pending order on behalf of the current user
pub async fn approve_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(order_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<OrderDecisionInput>,
) -> Result<Json<OrderDetails>, AppError> {
    ensure_self_approver(&user, &input)?;
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.approve(order_id, input).await?))
}

/// Reject a pending order on behalf of the current user
pub async fn reject_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(order_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<OrderDecisionInput>,
) -> Result<Json<OrderDetails>, AppError> {
    ensure_self_approver(&user, &input)?;
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.reject(order_id, input).await?))
}

/// Mark an approved order as delivered
pub async fn deliver_order(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<Uuid>,
) -> Result<Json<OrderDetails>, AppError> {
    let service = OrderService::new(state.db.clone());
    Ok(Json(service.mark_delivered(order_id).await?))
}

/// The body's `approver_id` must name the authenticated caller
fn ensure_self_approver(user: &AuthUser, input: &OrderDecisionInput) -> Result<(), AppError> {
    if input.approver_id != user.user_id {
        return Err(AppError::PermissionDenied(
            "approver_id must be the authenticated user".to_string(),
        ));
    }
    Ok(())
}
