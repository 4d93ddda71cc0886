//! Medicine catalogue HTTP handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::CurrentUser;
use crate::services::medicine::{CreateMedicineInput, MedicineFilter, UpdateMedicineInput};
use crate::services::{MedicineService, PermissionService};
use crate::AppState;
use shared::{Capability, Medicine, MedicineAlert};

/// Response for list of medicines
#[derive(Serialize)]
pub struct MedicinesResponse {
    pub medicines: Vec<Medicine>,
}

/// Response for medicine alerts
#[derive(Serialize)]
pub struct AlertsResponse {
    pub expiry_warning_days: i64,
    pub alerts: Vec<MedicineAlert>,
}

/// List medicines, optionally searched by name or company, or only low stock
pub async fn list_medicines(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<MedicineFilter>,
) -> Result<Json<MedicinesResponse>, AppError> {
    let service = MedicineService::new(state.db.clone());
    let medicines = service.list(filter).await?;
    Ok(Json(MedicinesResponse { medicines }))
}

/// Get a single medicine
pub async fn get_medicine(
    State(state): State<AppState>,
    ApiPath(medicine_id): ApiPath<Uuid>,
) -> Result<Json<Medicine>, AppError> {
    let service = MedicineService::new(state.db.clone());
    Ok(Json(service.get(medicine_id).await?))
}

/// Register a medicine (requires inventory management)
pub async fn create_medicine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<CreateMedicineInput>,
) -> Result<impl IntoResponse, AppError> {
    PermissionService::new(state.db.clone())
        .require(user.user_id, Capability::ManageInventory)
        .await?;

    let service = MedicineService::new(state.db.clone());
    let medicine = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(medicine)))
}

/// Update descriptive fields of a medicine (requires inventory management)
pub async fn update_medicine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(medicine_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateMedicineInput>,
) -> Result<Json<Medicine>, AppError> {
    PermissionService::new(state.db.clone())
        .require(user.user_id, Capability::ManageInventory)
        .await?;

    let service = MedicineService::new(state.db.clone());
    Ok(Json(service.update(medicine_id, input).await?))
}

/// Delete an unreferenced medicine (requires inventory management)
pub async fn delete_medicine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(medicine_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    PermissionService::new(state.db.clone())
        .require(user.user_id, Capability::ManageInventory)
        .await?;

    let service = MedicineService::new(state.db.clone());
    service.delete(medicine_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Low-stock and expiry alerts for today
pub async fn medicine_alerts(
    State(state): State<AppState>,
) -> Result<Json<AlertsResponse>, AppError> {
    let expiry_warning_days = state.config.alerts.expiry_warning_days;
    let service = MedicineService::new(state.db.clone());
    let alerts = service
        .alerts(Utc::now().date_naive(), expiry_warning_days)
        .await?;

    Ok(Json(AlertsResponse {
        expiry_warning_days,
        alerts,
    }))
}
