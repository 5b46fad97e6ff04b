use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

pub const GENERIC_INITIATION_ERROR: &str = "Failed to initiate payment";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// Credential exchange with the gateway failed. Carries the raw cause for logs.
    #[error("Gateway authentication failed: {0}")]
    Auth(String),

    /// Push rejected or transport failure. `message` is the gateway-supplied
    /// text when it sent one.
    #[error("Gateway error: {detail}")]
    Gateway {
        message: Option<String>,
        detail: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::Gateway { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Validation(errors) => json!({
                "ResponseCode": "1",
                "errorMessage": join_errors(errors),
                "errors": errors,
            }),
            AppError::Auth(detail) => {
                tracing::error!(error = %detail, "Gateway authentication failed");
                json!({
                    "ResponseCode": "1",
                    "errorMessage": GENERIC_INITIATION_ERROR,
                })
            }
            AppError::Gateway { message, detail } => {
                tracing::error!(error = %detail, "Gateway request failed");
                json!({
                    "ResponseCode": "1",
                    "errorMessage": message.as_deref().unwrap_or(GENERIC_INITIATION_ERROR),
                })
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                json!({ "error": "Internal server error" })
            }
            AppError::NotFound(_) | AppError::Unauthorized(_) => json!({
                "error": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
