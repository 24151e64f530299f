use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use super::guard::GateRejection;
use crate::domain::notices;
use crate::services::{AuthError, UserAdminError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Conflict(String),

    Unauthorized(String),

    Forbidden(String),

    ServiceUnavailable(String),

    InternalError(String),

    /// Authorization gate outcome, rendered as its redirect.
    Gate(GateRejection),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Gate(rejection) => write!(f, "Gate rejection: {:?}", rejection),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Gate(rejection) => return (*rejection).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    notices::GENERIC_FAILURE.to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<GateRejection> for ApiError {
    fn from(rejection: GateRejection) -> Self {
        ApiError::Gate(rejection)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationRequired => Self::Unauthorized(notices::LOGIN_REQUIRED.into()),
            AuthError::AuthorizationDenied => Self::Forbidden(notices::NOT_PERMITTED.into()),
            AuthError::InvalidCredentials => {
                Self::Unauthorized(notices::INVALID_CREDENTIALS.into())
            }
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::UserNotFound => Self::NotFound("User not found".into()),
            AuthError::SessionUnavailable => {
                Self::ServiceUnavailable(notices::SESSION_UNAVAILABLE.into())
            }
            AuthError::TransientStoreFailure(msg) => Self::internal(msg),
        }
    }
}

impl From<UserAdminError> for ApiError {
    fn from(err: UserAdminError) -> Self {
        match err {
            UserAdminError::DuplicateIdentity { field } => {
                Self::Conflict(format!("A user with this {field} already exists"))
            }
            UserAdminError::Validation(msg) => Self::validation(msg),
            UserAdminError::UserNotFound => Self::NotFound("User not found".into()),
            UserAdminError::NoTvAccount => {
                Self::NotFound("No active TV panel account exists".into())
            }
            UserAdminError::TransientStoreFailure(msg) => Self::internal(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::IdentityField;

    #[test]
    fn test_internal_errors_hide_detail() {
        let response = ApiError::internal("UNIQUE constraint failed: secret").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err: ApiError = UserAdminError::DuplicateIdentity {
            field: IdentityField::Email,
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(ref msg) if msg.contains("email")));
    }

    #[test]
    fn test_invalid_credentials_message() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert!(
            matches!(err, ApiError::Unauthorized(ref msg) if msg == notices::INVALID_CREDENTIALS)
        );
    }
}
