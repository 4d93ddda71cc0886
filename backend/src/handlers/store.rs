//! Medical store HTTP handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::CurrentUser;
use crate::services::store::{CreateStoreInput, UpdateStoreInput};
use crate::services::{PermissionService, StoreService};
use crate::AppState;
use shared::{Capability, MedicalStore};

/// Response for list of stores
#[derive(Serialize)]
pub struct StoresResponse {
    pub stores: Vec<MedicalStore>,
}

/// List all medical stores
pub async fn list_stores(State(state): State<AppState>) -> Result<Json<StoresResponse>, AppError> {
    let service = StoreService::new(state.db.clone());
    let stores = service.list().await?;
    Ok(Json(StoresResponse { stores }))
}

/// Get a single store
pub async fn get_store(
    State(state): State<AppState>,
    ApiPath(store_id): ApiPath<Uuid>,
) -> Result<Json<MedicalStore>, AppError> {
    let service = StoreService::new(state.db.clone());
    Ok(Json(service.get(store_id).await?))
}

/// Register a store (requires store management)
pub async fn create_store(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<CreateStoreInput>,
) -> Result<impl IntoResponse, AppError> {
    PermissionService::new(state.db.clone())
        .require(user.user_id, Capability::ManageStores)
        .await?;

    let service = StoreService::new(state.db.clone());
    let store = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

/// Update a store's details (requires store management)
pub async fn update_store(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(store_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateStoreInput>,
) -> Result<Json<MedicalStore>, AppError> {
    PermissionService::new(state.db.clone())
        .require(user.user_id, Capability::ManageStores)
        .await?;

    let service = StoreService::new(state.db.clone());
    Ok(Json(service.update(store_id, input).await?))
}
