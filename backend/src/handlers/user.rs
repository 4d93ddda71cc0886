//! User administration handlers

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
use crate::services::user::{CreateUserInput, UpdateCapabilitiesInput};
use crate::services::{PermissionService, UserService};
use crate::AppState;
use shared::User;

/// Response for list of users
#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// List all users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UsersResponse>, AppError> {
    PermissionService::new(state.db.clone())
        .require_admin(user.user_id)
        .await?;

    let users = UserService::new(state.db.clone()).list().await?;
    Ok(Json(UsersResponse { users }))
}

/// Get a user. Anyone may read their own record; admins may read any.
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<User>, AppError> {
    if user.user_id != user_id {
        PermissionService::new(state.db.clone())
            .require_admin(user.user_id)
            .await?;
    }

    Ok(Json(UserService::new(state.db.clone()).get(user_id).await?))
}

/// Create a user (admin only)
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> Result<impl IntoResponse, AppError> {
    PermissionService::new(state.db.clone())
        .require_admin(user.user_id)
        .await?;

    let created = UserService::new(state.db.clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace an employee's capabilities (admin only)
pub async fn update_capabilities(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateCapabilitiesInput>,
) -> Result<Json<User>, AppError> {
    PermissionService::new(state.db.clone())
        .require_admin(user.user_id)
        .await?;

    let service = UserService::new(state.db.clone());
    Ok(Json(service.update_capabilities(user_id, input).await?))
}
