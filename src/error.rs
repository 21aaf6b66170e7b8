//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::{PasswordError, TokenError};
use crate::domain::{DomainError, ValueError};
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid phone or password")]
    InvalidCredentials,

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Party not found: {0}")]
    PartyNotFound(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StillReferenced(constraint) => AppError::Conflict(format!(
                "record is still referenced ({})",
                constraint
            )),
            StoreError::Duplicate(constraint) => {
                AppError::Conflict(format!("duplicate record ({})", constraint))
            }
            StoreError::RowMissing { .. } => AppError::Internal(err.to_string()),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ValueError> for AppError {
    fn from(err: ValueError) -> Self {
        AppError::Domain(DomainError::from(err))
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid(_) => AppError::InvalidToken,
            TokenError::Encode(msg) => AppError::Internal(msg),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 401 Unauthorized
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid_credentials", None)
            }
            AppError::InvalidOtp => (StatusCode::UNAUTHORIZED, "invalid_otp", None),
            AppError::MissingToken => (StatusCode::UNAUTHORIZED, "missing_token", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),

            // 403 Forbidden
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),

            // 404 Not Found
            AppError::ItemNotFound(id) => {
                (StatusCode::NOT_FOUND, "item_not_found", Some(id.clone()))
            }
            AppError::PartyNotFound(id) => {
                (StatusCode::NOT_FOUND, "party_not_found", Some(id.clone()))
            }
            AppError::InvoiceNotFound(id) => {
                (StatusCode::NOT_FOUND, "invoice_not_found", Some(id.clone()))
            }
            AppError::UserNotFound(id) => {
                (StatusCode::NOT_FOUND, "user_not_found", Some(id.clone()))
            }

            // 409 Conflict
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => {
                use crate::domain::DomainError;
                match domain_err {
                    DomainError::InvalidValue(e) => {
                        (StatusCode::BAD_REQUEST, "invalid_value", Some(e.to_string()))
                    }
                    DomainError::EmptyInvoice => {
                        (StatusCode::BAD_REQUEST, "empty_invoice", None)
                    }
                    DomainError::UnknownItems { missing } => {
                        let ids: Vec<String> = missing.iter().map(|id| id.to_string()).collect();
                        (StatusCode::BAD_REQUEST, "invalid_items", Some(ids.join(",")))
                    }
                    DomainError::InvalidParty(id) => {
                        (StatusCode::BAD_REQUEST, "invalid_party", Some(id.to_string()))
                    }
                    DomainError::Unauthorized(msg) => {
                        (StatusCode::FORBIDDEN, "unauthorized", Some(msg.clone()))
                    }
                    DomainError::BusinessRuleViolation(msg) => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "business_rule_violation",
                        Some(msg.clone()),
                    ),
                    DomainError::InvalidInvoiceNumber(raw) => {
                        tracing::error!(invoice_no = %raw, "Stored invoice number is not numeric");
                        (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
                    }
                }
            }

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        }
    }

    /// HTTP status this error is answered with
    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.status_and_code();

        // Server-side failures never echo their cause
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, ValueError};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_client_error_statuses() {
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::InvalidOtp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InvoiceNotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::Conflict("x".to_string()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_domain_error_statuses() {
        let unknown = AppError::from(DomainError::unknown_items(vec![Uuid::nil()]));
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

        let party = AppError::from(DomainError::InvalidParty(Uuid::nil()));
        assert_eq!(party.status(), StatusCode::BAD_REQUEST);

        let role = AppError::from(DomainError::Unauthorized("admin only".to_string()));
        assert_eq!(role.status(), StatusCode::FORBIDDEN);

        let value = AppError::from(DomainError::from(ValueError::Negative {
            field: "rate",
            value: Decimal::NEGATIVE_ONE,
        }));
        assert_eq!(value.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_store_conflicts_map_to_409() {
        let err = AppError::from(StoreError::StillReferenced("invoice_items_item_id_fkey".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = AppError::from(StoreError::Duplicate("invoices_owner_id_invoice_no_key".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        assert_eq!(AppError::from(TokenError::Expired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::from(TokenError::Encode("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        use http_body_util::BodyExt;

        let response = AppError::from(DomainError::unknown_items(vec![Uuid::nil()])).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error_code"], "invalid_items");
        assert_eq!(json["details"], Uuid::nil().to_string());
    }

    #[tokio::test]
    async fn test_internal_error_is_not_leaked() {
        use http_body_util::BodyExt;

        let response = AppError::Internal("connection string leaked".to_string()).into_response();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["error"], "Internal server error");
        assert!(json.get("details").is_none());
    }
}
