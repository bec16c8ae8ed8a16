//! Request helpers shared by auth handlers and the gate.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header::COOKIE, request::Parts},
};
use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use super::state::AuthState;

pub const SESSION_COOKIE_NAME: &str = "admin_token";

pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MAX_CHARS: usize = 128;

// Creation policy only; existing credentials are never re-judged at login.
pub const NEW_USERNAME_MIN_CHARS: usize = 3;
pub const NEW_PASSWORD_MIN_CHARS: usize = 8;

const UNKNOWN_CLIENT: &str = "unknown";

/// Identifier used to key login attempts.
///
/// Proxy headers are only honoured when the deployment says a trusted proxy
/// sits in front; otherwise any client could pick its own bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let trust_forwarded_for = parts
            .extensions
            .get::<Arc<AuthState>>()
            .is_some_and(|state| state.config().trust_forwarded_for());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self(resolve_client_id(
            &parts.headers,
            peer,
            trust_forwarded_for,
        )))
    }
}

pub(super) fn resolve_client_id(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        if let Some(ip) = extract_client_ip(headers) {
            return ip;
        }
    }
    peer.map_or_else(|| UNKNOWN_CLIENT.to_string(), |addr| addr.ip().to_string())
}

/// Extract a client IP from common proxy headers.
///
/// Only the last `X-Forwarded-For` hop is used: that is the address the
/// trusted proxy appended. Everything to its left came from the client.
fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .last();
    if let Some(hop) = forwarded {
        return Some(hop.to_string());
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Read the session token from the `Cookie` header(s).
pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == SESSION_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Check login body bounds. Lengths count characters, not bytes.
///
/// Login only rejects what cannot be a credential at all: empty fields and
/// oversized input. Minimum lengths belong to [`validate_new_credentials`].
pub fn validate_login_input(username: &str, password: &str) -> Result<(), String> {
    let username_chars = username.trim().chars().count();
    if !(1..=USERNAME_MAX_CHARS).contains(&username_chars) {
        return Err(format!(
            "Username is required and must be at most {USERNAME_MAX_CHARS} characters"
        ));
    }
    let password_chars = password.chars().count();
    if !(1..=PASSWORD_MAX_CHARS).contains(&password_chars) {
        return Err(format!(
            "Password is required and must be at most {PASSWORD_MAX_CHARS} characters"
        ));
    }
    Ok(())
}

/// Policy for provisioning an administrator.
pub fn validate_new_credentials(username: &str, password: &str) -> Result<(), String> {
    let username_chars = username.trim().chars().count();
    if !(NEW_USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&username_chars) {
        return Err(format!(
            "Username must be between {NEW_USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"
        ));
    }
    validate_new_password(password)
}

pub fn validate_new_password(password: &str) -> Result<(), String> {
    let password_chars = password.chars().count();
    if !(NEW_PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&password_chars) {
        return Err(format!(
            "Password must be between {NEW_PASSWORD_MIN_CHARS} and {PASSWORD_MAX_CHARS} characters"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some(SocketAddr::from(([203, 0, 113, 7], 54321)))
    }

    #[test]
    fn client_id_ignores_proxy_headers_by_default() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        assert_eq!(resolve_client_id(&headers, peer(), false), "203.0.113.7");
    }

    #[test]
    fn client_id_prefers_forwarded_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(resolve_client_id(&headers, peer(), true), "5.6.7.8");
    }

    #[test]
    fn client_id_uses_the_hop_the_proxy_appended() {
        let mut headers = HeaderMap::new();
        headers.append("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.append(
            "x-forwarded-for",
            HeaderValue::from_static("10.0.0.2, 198.51.100.23 ,"),
        );
        assert_eq!(resolve_client_id(&headers, peer(), true), "198.51.100.23");
    }

    #[test]
    fn client_id_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(resolve_client_id(&headers, peer(), true), "9.9.9.9");

        let headers = HeaderMap::new();
        assert_eq!(resolve_client_id(&headers, peer(), true), "203.0.113.7");
    }

    #[test]
    fn client_id_unknown_without_any_source() {
        assert_eq!(resolve_client_id(&HeaderMap::new(), None, false), "unknown");
    }

    #[test]
    fn session_token_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; admin_token=abc.def.ghi; other=1"),
        );
        assert_eq!(
            extract_session_token(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn session_token_absent_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("admin_token="));
        assert_eq!(extract_session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("admin_tokenx=abc"));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn login_input_bounds() {
        assert!(validate_login_input("admin", "correct-horse").is_ok());
        assert!(validate_login_input("admin", "correct").is_ok());
        assert!(validate_login_input("ab", "x").is_ok());
        assert!(validate_login_input(&"a".repeat(51), "correct-horse").is_err());
        assert!(validate_login_input("admin", "").is_err());
        assert!(validate_login_input("admin", &"p".repeat(129)).is_err());
        assert!(validate_login_input("   ", "correct-horse").is_err());
    }

    #[test]
    fn new_credentials_policy() {
        assert!(validate_new_credentials("admin", "correct-horse").is_ok());
        assert!(validate_new_credentials("ab", "correct-horse").is_err());
        assert!(validate_new_credentials("admin", "correct").is_err());
        assert!(validate_new_password(&"p".repeat(128)).is_ok());
        assert!(validate_new_password(&"p".repeat(129)).is_err());
    }
}
