use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;
use crate::api::dtos::responses::ApiResponse;
use crate::domain::models::booking::BookingStatus;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("Validation failed")]
    ValidationErrors(Vec<String>),
    #[error("Invalid status: cannot {action} a booking that is {status}")]
    InvalidStatus {
        action: &'static str,
        status: BookingStatus,
    },
    #[error("Room service error: {0}")]
    Upstream(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// Detail lines carried in the `errors` array of the response envelope.
    pub fn details(&self) -> Vec<String> {
        match self {
            AppError::ValidationErrors(errors) => errors.clone(),
            AppError::Database(_) | AppError::Internal | AppError::InternalWithMsg(_) => Vec::new(),
            other => vec![other.to_string()],
        }
    }

    /// Unexpected infrastructure failures, as opposed to business rule rejections.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Upstream(_) | AppError::Internal | AppError::InternalWithMsg(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => format!("{}: {}", field, msg),
                    None => format!("{}: invalid value ({})", field, e.code),
                })
            })
            .collect();
        messages.sort();
        AppError::ValidationErrors(messages)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    if code == "2067" {
                        let body = ApiResponse::<()>::failure("Resource already exists (duplicate entry)", Vec::new());
                        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ValidationErrors(_) => (StatusCode::BAD_REQUEST, "Validation failed".to_string()),
            AppError::InvalidStatus { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Upstream(msg) => {
                error!("Room service failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "Room service unavailable".to_string())
            }
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = ApiResponse::<()>::failure(message, self.details());
        (status, Json(body)).into_response()
    }
}
