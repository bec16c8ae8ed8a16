//! Administrator login.
//!
//! Each step short-circuits: input validation, attempt limiter, credential
//! lookup, password verification, then token issuance and the session cookie.

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{
    credentials::ADMIN_ROLE,
    error::AuthError,
    password::{equalize_timing, verify_blocking},
    session::session_cookie,
    state::AuthState,
    types::{ErrorResponse, LoginRequest, SuccessResponse},
    utils::{ClientId, validate_login_input},
};

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = SuccessResponse),
        (status = 400, description = "Malformed input", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    ClientId(client_id): ClientId,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return AuthError::InvalidInput(format!("Invalid request body: {}", rejection.body_text()))
                .into_response();
        }
    };

    let token = match authenticate(&auth_state, &client_id, &request).await {
        Ok(token) => token,
        Err(err) => return err.into_response(),
    };

    let cookie = match session_cookie(auth_state.config(), &token) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return AuthError::Internal(err.to_string()).into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (StatusCode::OK, headers, Json(SuccessResponse::ok())).into_response()
}

/// Run the login sequence and return a signed session token.
async fn authenticate(
    auth_state: &AuthState,
    client_id: &str,
    request: &LoginRequest,
) -> Result<String, AuthError> {
    validate_login_input(&request.username, &request.password).map_err(AuthError::InvalidInput)?;
    let username = request.username.trim();

    let permit = auth_state.limiter().begin(client_id).map_err(|limited| {
        warn!(client_id, "Login blocked: {limited}");
        AuthError::RateLimited {
            retry_after: limited.retry_after,
        }
    })?;

    // An early return from here on drops the permit unsettled, refunding the attempt.
    let record = auth_state
        .credentials()
        .find_by_username(username)
        .await
        .map_err(|err| {
            error!("Credential lookup failed: {err}");
            AuthError::StorageUnavailable
        })?;

    let Some(record) = record else {
        equalize_timing(request.password.clone())
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?;
        permit.fail();
        warn!(client_id, username, "Login failed: invalid credentials");
        return Err(AuthError::InvalidCredentials);
    };

    let matches = verify_blocking(request.password.clone(), record.password_hash.clone())
        .await
        .map_err(|err| {
            error!("Password verification task failed: {err}");
            AuthError::Internal(err.to_string())
        })?;

    if !matches || record.role != ADMIN_ROLE {
        permit.fail();
        warn!(client_id, username, "Login failed: invalid credentials");
        return Err(AuthError::InvalidCredentials);
    }

    permit.succeed();

    let token = auth_state
        .codec()
        .issue(&record.username, ADMIN_ROLE, auth_state.config().session_ttl())
        .map_err(|err| {
            error!("Failed to issue session token: {err}");
            AuthError::Internal(err.to_string())
        })?;

    info!(client_id, username = %record.username, "Administrator logged in");
    Ok(token)
}
