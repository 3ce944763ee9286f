// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::context::MissingIdentityContext;
use crate::quota::QuotaError;
use crate::store::StoreError;

/// HTTP-facing error with appropriate status codes and client-safe messages.
/// Internal detail is logged through `tracing` and never serialized.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg) => msg,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// The generic rejection used on every token-validation path. One body
    /// for malformed, tampered and expired tokens alike.
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid credentials".to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal() -> Self {
        ApiError::InternalServerError("An error occurred processing your request".to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken => ApiError::unauthorized(),
            AuthError::WeakSecret | AuthError::TokenGeneration(_) => {
                tracing::error!("token codec failure: {}", err);
                ApiError::internal()
            }
        }
    }
}

impl From<QuotaError> for ApiError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::LimitExceeded { .. } => ApiError::forbidden(err.to_string()),
            QuotaError::UnrecognizedPlan(ref plan) => {
                // Fail closed: an unknown plan never default-admits
                tracing::warn!("denying creation under unrecognized plan '{}'", plan);
                ApiError::forbidden("Subscription plan does not permit creating this resource")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::bad_request("Email already registered"),
            StoreError::Database(e) => {
                // Log the real error but return a generic message
                tracing::error!("database error: {}", e);
                ApiError::internal()
            }
        }
    }
}

impl From<MissingIdentityContext> for ApiError {
    fn from(err: MissingIdentityContext) -> Self {
        // Programmer error: a handler read identity outside an authenticated
        // request. Loud in the log, opaque to the client.
        tracing::error!("{}", err);
        ApiError::internal()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_body_is_generic() {
        let err: ApiError = AuthError::InvalidToken.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_json(), json!({ "error": "Unauthorized" }));
    }

    #[test]
    fn quota_limit_maps_to_forbidden_with_message() {
        let err: ApiError = QuotaError::LimitExceeded { limit: 3 }.into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(err.message().contains("FREE plan"));
    }

    #[test]
    fn unknown_plan_fails_closed_without_echoing_the_value() {
        let err: ApiError = QuotaError::UnrecognizedPlan("ENTERPRISE".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(!err.message().contains("ENTERPRISE"));
    }
}
