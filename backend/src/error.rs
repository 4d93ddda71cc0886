//! Error handling for the pharmaceutical distribution backend
//!
//! Every failure leaves the API as `{"error": {"code", "message", "field"?}}`
//! with a stable machine-readable code.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::DomainError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication and authorization errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    // Order workflow errors
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Order has already been delivered")]
    AlreadyDelivered,

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &str, message: &str) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::InvalidState(_)
            | AppError::InsufficientStock { .. }
            | AppError::AlreadyDelivered => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::Validation { .. } | AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            AppError::AlreadyDelivered => "ALREADY_DELIVERED",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::PermissionDenied(_) => AppError::PermissionDenied(err.to_string()),
            DomainError::InvalidState { .. } => AppError::InvalidState(err.to_string()),
            DomainError::InsufficientStock {
                available,
                requested,
            } => AppError::InsufficientStock {
                available,
                requested,
            },
            DomainError::AlreadyDelivered => AppError::AlreadyDelivered,
            DomainError::InvalidQuantity(_) => AppError::validation("quantity", &err.to_string()),
            DomainError::StockOverflow => AppError::validation("quantity", &err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let detail = errs
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .next()
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{} {}", field, detail)
            })
            .collect();
        fields.sort();
        AppError::ValidationError(fields.join("; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    return AppError::Conflict {
                        resource: constraint,
                        message: "A record with the same unique value already exists".to_string(),
                    }
                }
                // foreign_key_violation
                Some("23503") => return foreign_key_error(&constraint),
                // check_violation
                Some("23514") => {
                    return AppError::Conflict {
                        resource: constraint,
                        message: "The change violates a data constraint".to_string(),
                    }
                }
                _ => {}
            }
        }
        AppError::DatabaseError(err)
    }
}

/// Foreign keys either point at a missing row (on insert) or protect a
/// referenced row (on delete).
fn foreign_key_error(constraint: &str) -> AppError {
    match constraint {
        "orders_store_id_fkey" => AppError::NotFound("Store".to_string()),
        "orders_medicine_id_fkey" | "supplies_medicine_id_fkey" => {
            AppError::NotFound("Medicine".to_string())
        }
        "orders_requester_id_fkey" | "supplies_received_by_fkey" => {
            AppError::NotFound("User".to_string())
        }
        other => AppError::Conflict {
            resource: other.to_string(),
            message: "The record is still referenced by other records".to_string(),
        },
    }
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.into(),
                field: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, field) = match &self {
            AppError::NotFound(resource) => (format!("{} not found", resource), None),
            AppError::Validation { field, message } => (message.clone(), Some(field.clone())),
            AppError::Conflict { resource, message } => (message.clone(), Some(resource.clone())),
            AppError::DatabaseError(_) => ("A database error occurred".to_string(), None),
            AppError::Internal(_) => ("An internal server error occurred".to_string(), None),
            other => (other.to_string(), None),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!(code = self.code(), "Request rejected: {}", self);
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Capability, OrderAction, OrderStatus};

    #[test]
    fn domain_errors_map_to_http_statuses() {
        let cases = [
            (
                DomainError::PermissionDenied(Capability::ApproveOrders),
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
            ),
            (
                DomainError::InvalidState {
                    current: OrderStatus::Approved,
                    action: OrderAction::Approve,
                },
                StatusCode::BAD_REQUEST,
                "INVALID_STATE",
            ),
            (
                DomainError::InsufficientStock {
                    available: 10,
                    requested: 20,
                },
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_STOCK",
            ),
            (
                DomainError::AlreadyDelivered,
                StatusCode::BAD_REQUEST,
                "ALREADY_DELIVERED",
            ),
            (
                DomainError::InvalidQuantity(0),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
        ];

        for (domain, status, code) in cases {
            let err = AppError::from(domain);
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn invalid_state_message_names_current_status() {
        let err = AppError::from(DomainError::InvalidState {
            current: OrderStatus::Rejected,
            action: OrderAction::Approve,
        });
        assert!(err.to_string().contains("rejected"));
    }

    #[test]
    fn store_foreign_key_maps_to_not_found() {
        assert!(matches!(
            foreign_key_error("orders_store_id_fkey"),
            AppError::NotFound(resource) if resource == "Store"
        ));
        assert!(matches!(
            foreign_key_error("orders_medicine_id_fkey"),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            foreign_key_error("something_else_fkey"),
            AppError::Conflict { .. }
        ));
    }
}
