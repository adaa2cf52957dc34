// ABOUTME: Shared API response types and error handling
// ABOUTME: Provides consistent response format across all API endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use escrowdesk_core::ValidationError;
use escrowdesk_storage::StorageError;
use serde::Serialize;
use tracing::{error, warn};

use crate::manager::ManagerError;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// 200 with the payload wrapped in `ApiResponse`
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, ResponseJson(ApiResponse::success(data))).into_response()
}

/// 201 with the payload wrapped in `ApiResponse`
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, ResponseJson(ApiResponse::success(data))).into_response()
}

fn validation_message(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convert manager errors to HTTP responses
impl IntoResponse for ManagerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ManagerError::Validation(errors) => {
                warn!("Rejected request: {}", validation_message(errors));
                (StatusCode::BAD_REQUEST, validation_message(errors))
            }
            ManagerError::InvalidTransition(reason) => {
                warn!("Rejected transition: {}", reason);
                (StatusCode::BAD_REQUEST, reason.clone())
            }
            ManagerError::Storage(StorageError::InvalidReference(reason)) => {
                warn!("Rejected reference: {}", reason);
                (StatusCode::BAD_REQUEST, format!("Invalid reference: {}", reason))
            }
            ManagerError::NotFound(_) | ManagerError::Storage(StorageError::NotFound) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ManagerError::Storage(err) => {
                error!(error = %err, "Storage failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, ResponseJson(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                ManagerError::Validation(vec![ValidationError::new("amount", "Amount must be positive")]),
                StatusCode::BAD_REQUEST,
            ),
            (
                ManagerError::InvalidTransition("not complete".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ManagerError::NotFound("Escrow 3".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                ManagerError::Storage(StorageError::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                ManagerError::Storage(StorageError::InvalidReference(
                    "category 99 does not exist".to_string(),
                )),
                StatusCode::BAD_REQUEST,
            ),
            (
                ManagerError::Storage(StorageError::Database("connection reset".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
