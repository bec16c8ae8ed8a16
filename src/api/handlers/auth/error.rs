//! Login failure taxonomy and its HTTP mapping.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use std::time::Duration;

use super::types::ErrorResponse;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
pub const RATE_LIMITED_MESSAGE: &str = "Too many login attempts. Please try again later.";
pub const SERVER_ERROR_MESSAGE: &str = "An error occurred during login";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Unknown username and wrong password are deliberately the same variant.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("rate limited for {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },
    #[error("credential store unavailable")]
    StorageUnavailable,
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::StorageUnavailable | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            Self::RateLimited { .. } => RATE_LIMITED_MESSAGE.to_string(),
            Self::StorageUnavailable | Self::Internal(_) => SERVER_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.client_message(),
        });
        let mut response = (self.status(), body).into_response();

        if let Self::RateLimited { retry_after } = self {
            // Round up so clients never retry a second early.
            let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(seconds.max(1)));
        }

        response
    }
}
