use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::payments::PaymentError;
use crate::qr::IssuanceError;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

const RETRY_HINT: &str = "please try again";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::TokenGenerationError(_) | AppError::PersistenceError(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::DatabaseError(_)
            | AppError::ConfigurationError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ExternalServiceError(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::TokenGenerationError(_) => "TOKEN_GENERATION_ERROR",
            AppError::PersistenceError(_) => "PERSISTENCE_ERROR",
            AppError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// The short message shown to the caller. Upstream details stay in the
    /// logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::ConfigurationError(msg) => msg.clone(),
            AppError::DatabaseError(_) => format!("A database error occurred, {RETRY_HINT}"),
            AppError::ExternalServiceError(_) => {
                format!("An upstream service failed, {RETRY_HINT}")
            }
            AppError::TokenGenerationError(_) => {
                format!("Could not generate a QR code, {RETRY_HINT}")
            }
            AppError::PersistenceError(_) => format!("Could not save the QR code, {RETRY_HINT}"),
            AppError::InternalServerError(_) => "Internal server error".to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => {
                tracing::debug!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::ExternalServiceError(msg)
            | AppError::TokenGenerationError(msg)
            | AppError::PersistenceError(msg)
            | AppError::ConfigurationError(msg)
            | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        error_response(self.code(), self.public_message(), self.status_code())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(e) => AppError::DatabaseError(e),
            StoreError::Unavailable(msg) => AppError::ExternalServiceError(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::AuthError(e.to_string())
    }
}

impl From<IssuanceError> for AppError {
    fn from(e: IssuanceError) -> Self {
        match e {
            IssuanceError::NotFound(entity) => {
                AppError::NotFound(format!("{} '{}' was not found", entity.kind, entity.id))
            }
            IssuanceError::NotPaid(entity) => AppError::ValidationError(format!(
                "{} '{}' has not been paid",
                entity.kind, entity.id
            )),
            IssuanceError::TokenGeneration(e) => AppError::TokenGenerationError(e.to_string()),
            IssuanceError::Persistence(e) => AppError::PersistenceError(e.to_string()),
            IssuanceError::Lookup { source, .. } => source.into(),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        match e {
            PaymentError::NotConfigured => AppError::ConfigurationError(e.to_string()),
            PaymentError::Http(_) | PaymentError::Provider { .. } | PaymentError::Decode(_) => {
                AppError::ExternalServiceError(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityRef;
    use crate::qr::TokenError;
    use uuid::Uuid;

    #[test]
    fn test_upstream_details_are_not_exposed() {
        let err = AppError::ExternalServiceError("stripe said: sk_live_123 invalid".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!err.public_message().contains("sk_live"));
    }

    #[test]
    fn test_issuance_errors_map_to_taxonomy() {
        let entity = EntityRef::ticket(Uuid::new_v4());

        let err: AppError = IssuanceError::TokenGeneration(TokenError::Empty).into();
        assert_eq!(err.code(), "TOKEN_GENERATION_ERROR");
        assert!(err.public_message().contains("try again"));

        let err: AppError = IssuanceError::NotPaid(entity).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: AppError = IssuanceError::NotFound(entity).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: AppError =
            IssuanceError::Persistence(StoreError::Unavailable("down".to_string())).into();
        assert_eq!(err.code(), "PERSISTENCE_ERROR");
    }

    #[test]
    fn test_missing_payment_secret_is_configuration_error() {
        let err: AppError = PaymentError::NotConfigured.into();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
