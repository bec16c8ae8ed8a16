//! Request gate for protected paths.
//!
//! Every request passes through [`request_gate`]. Paths outside the configured
//! protected prefixes (and the login path itself) go straight through. For a
//! protected path the session cookie must carry a token that verifies under the
//! process key and whose role is `admin`; the verified identity is then
//! attached to the request as an [`AdminIdentity`] extension.
//!
//! Failures never reach the handler:
//! - no cookie: `307` to the login path with `from=<original path>`;
//! - bad, expired or wrong-role token: the cookie is cleared and the client is
//!   sent to the login path without a return target.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::form_urlencoded;

use super::{
    credentials::ADMIN_ROLE,
    session::clear_session_cookie,
    state::{AuthConfig, AuthState},
    token::{SessionClaims, TokenCodec},
    utils::extract_session_token,
};

/// Identity forwarded to protected handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminIdentity {
    pub username: String,
    pub role: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<SessionClaims> for AdminIdentity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            username: claims.sub,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Public path; no token check.
    Public,
    /// Protected path with a valid admin session.
    Authorized(AdminIdentity),
    /// Protected path without a session cookie.
    Login { from: String },
    /// Protected path with a cookie that must be discarded.
    Reject { reason: String },
}

/// Decide what happens to a request for `path` carrying `token`.
#[must_use]
pub fn decide(
    config: &AuthConfig,
    codec: &TokenCodec,
    path: &str,
    token: Option<&str>,
) -> GateDecision {
    if path == config.login_path() || !is_protected(path, config.protected_prefixes()) {
        return GateDecision::Public;
    }

    let Some(token) = token else {
        return GateDecision::Login {
            from: path.to_string(),
        };
    };

    match codec.verify(token) {
        Ok(claims) if claims.role == ADMIN_ROLE => GateDecision::Authorized(claims.into()),
        Ok(claims) => GateDecision::Reject {
            reason: format!("role {:?} is not {ADMIN_ROLE}", claims.role),
        },
        Err(err) => GateDecision::Reject {
            reason: err.to_string(),
        },
    }
}

/// Segment-aware prefix match: `/admin` covers `/admin` and `/admin/...`.
fn is_protected(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        path.strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

fn login_redirect_target(login_path: &str, from: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(from.as_bytes()).collect();
    format!("{login_path}?from={encoded}")
}

pub async fn request_gate(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let config = auth_state.config();
    let path = request.uri().path().to_string();
    let token = extract_session_token(request.headers());

    match decide(config, auth_state.codec(), &path, token.as_deref()) {
        GateDecision::Public => next.run(request).await,
        GateDecision::Authorized(identity) => {
            debug!(username = %identity.username, "Admin session accepted");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        GateDecision::Login { from } => {
            debug!(path = %from, "No session cookie, redirecting to login");
            Redirect::temporary(&login_redirect_target(config.login_path(), &from))
                .into_response()
        }
        GateDecision::Reject { reason } => {
            warn!(path = %path, "Rejected session token: {reason}");
            let mut response = Redirect::temporary(config.login_path()).into_response();
            match clear_session_cookie(config) {
                Ok(cookie) => {
                    response.headers_mut().append(SET_COOKIE, cookie);
                }
                Err(err) => error!("Failed to build clearing cookie: {err}"),
            }
            response
        }
    }
}
