//! Supply (restock) HTTP handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::CurrentUser;
use crate::services::supply::{RecordSupplyInput, SupplyFilter};
use crate::services::{PermissionService, SupplyService};
use crate::AppState;
use shared::Supply;

/// Response for list of supplies
#[derive(Serialize)]
pub struct SuppliesResponse {
    pub supplies: Vec<Supply>,
}

/// List received supplies, optionally for one medicine
pub async fn list_supplies(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<SupplyFilter>,
) -> Result<Json<SuppliesResponse>, AppError> {
    let service = SupplyService::new(state.db.clone());
    let supplies = service.list(filter).await?;
    Ok(Json(SuppliesResponse { supplies }))
}

/// Record a supply received by the current user
pub async fn record_supply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<RecordSupplyInput>,
) -> Result<impl IntoResponse, AppError> {
    let actor = PermissionService::new(state.db.clone())
        .resolve(user.user_id)
        .await?;

    let service = SupplyService::new(state.db.clone());
    let supply = service.record_supply(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(supply)))
}
