use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by JSON endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No batch of the cookie holds positive stock.
    #[error("No batch with available stock for cookie {cookie_id}")]
    NoAvailableBatch { cookie_id: i32 },

    /// The oldest eligible batch cannot cover the requested quantity.
    #[error("Requested quantity ({requested}) exceeds batch stock ({available})")]
    InsufficientStock { requested: i32, available: i32 },

    /// The referenced row is not part of the choice set offered to the caller.
    #[error("Not eligible: {0}")]
    NotEligible(String),

    /// A cookie with this name already exists in the catalog.
    #[error("A cookie named '{name}' already exists")]
    DuplicateCookie { name: String },

    /// A conditional update lost against a concurrent writer.
    #[error("Concurrent modification of batch {batch_id}")]
    ConcurrentModification { batch_id: i32 },

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidInput(_) | Self::NotEligible(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NoAvailableBatch { .. } | Self::InsufficientStock { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::ConcurrentModification { .. } | Self::DuplicateCookie { .. } => {
                StatusCode::CONFLICT
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn service_error_response_includes_request_id() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("req-123"), async {
                ServiceError::NotFound("missing".into()).into_response()
            })
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.request_id.as_deref(), Some("req-123"));
    }

    #[test]
    fn stock_rules_map_to_unprocessable_entity() {
        assert_eq!(
            ServiceError::NoAvailableBatch { cookie_id: 1 }.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::InsufficientStock {
                requested: 12,
                available: 10
            }
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::ConcurrentModification { batch_id: 3 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::DuplicateCookie {
                name: "Chocolate".into()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn insufficient_stock_message_names_both_quantities() {
        let msg = ServiceError::InsufficientStock {
            requested: 12,
            available: 10,
        }
        .response_message();
        assert!(msg.contains("12"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn database_errors_hide_details() {
        let err = ServiceError::DatabaseError(DbErr::Custom("table cookies is locked".into()));
        assert_eq!(err.response_message(), "Database error");
    }
}
