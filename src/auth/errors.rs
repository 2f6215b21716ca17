//! Authentication error types.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::api::error::redfish_error;
use crate::db::StoreError;

/// Seconds a client should wait before retrying after a store outage.
const RETRY_AFTER_SECS: &str = "5";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bad login credentials. Deliberately says nothing about which part was wrong.
    #[error("authentication failed")]
    AuthenticationFailed,
    /// Missing, revoked or expired credentials on a protected path.
    #[error("not authenticated")]
    Unauthenticated,
    /// Malformed or tampered token. Rendered exactly like `Unauthenticated`.
    #[error("invalid token")]
    InvalidToken,
    #[error("session not found")]
    SessionNotFound,
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AuthenticationFailed => StatusCode::BAD_REQUEST,
            AuthError::Unauthenticated | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::SessionNotFound => StatusCode::NOT_FOUND,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AuthError::AuthenticationFailed => "Base.1.8.GeneralError",
            AuthError::Unauthenticated | AuthError::InvalidToken => "Base.1.8.NoValidSession",
            AuthError::SessionNotFound => "Base.1.8.ResourceMissingAtURI",
            AuthError::StoreUnavailable(_) => "Base.1.8.ServiceTemporarilyUnavailable",
            AuthError::Internal(_) => "Base.1.8.InternalError",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::AuthenticationFailed => "Invalid username or password",
            AuthError::Unauthenticated | AuthError::InvalidToken => {
                "There is no valid session established with the implementation"
            }
            AuthError::SessionNotFound => "The requested session was not found",
            AuthError::StoreUnavailable(_) => "The service is temporarily unavailable",
            AuthError::Internal(_) => "The request failed due to an internal service error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut response = redfish_error(self.status_code(), self.code(), self.message());

        let headers = response.headers_mut();
        match self {
            AuthError::Unauthenticated | AuthError::InvalidToken => {
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            AuthError::StoreUnavailable(_) => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
            }
            _ => {}
        }

        response
    }
}
