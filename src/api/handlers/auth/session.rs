//! Session cookie helpers, logout and session introspection.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{error, info};

use super::{
    gate::AdminIdentity,
    state::{AuthConfig, AuthState},
    types::{SessionResponse, SuccessResponse},
    utils::SESSION_COOKIE_NAME,
};

/// Build the `HttpOnly` session cookie carrying `token`.
pub(super) fn session_cookie(
    auth_config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = auth_config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={ttl_seconds}"
    );
    if auth_config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_session_cookie(
    auth_config: &AuthConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if auth_config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = SuccessResponse)
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Tokens are not tracked server-side; clearing the cookie is the whole logout.
    let mut headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build logout cookie: {err}"),
    }
    info!("Administrator logged out");
    (StatusCode::OK, headers, Json(SuccessResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/admin/session",
    responses(
        (status = 200, description = "Current administrator session", body = SessionResponse),
        (status = 307, description = "No valid session; redirected to login")
    ),
    tag = "auth"
)]
pub async fn session(identity: Extension<AdminIdentity>) -> impl IntoResponse {
    let response = SessionResponse {
        username: identity.username.clone(),
        role: identity.role.clone(),
        issued_at: rfc3339(identity.issued_at),
        expires_at: rfc3339(identity.expires_at),
    };
    (StatusCode::OK, Json(response))
}

fn rfc3339(unix_seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix_seconds, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
