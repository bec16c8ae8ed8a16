//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login body. Fields default to empty so a missing field is reported as a
/// validation error rather than a JSON rejection.
#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    #[must_use]
    pub const fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub username: String,
    pub role: String,
    pub issued_at: String,
    pub expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn login_request_tolerates_missing_fields() -> Result<()> {
        let decoded: LoginRequest = serde_json::from_str(r#"{"username":"admin"}"#)?;
        assert_eq!(decoded.username, "admin");
        assert!(decoded.password.is_empty());
        Ok(())
    }

    #[test]
    fn login_request_debug_redacts_password() {
        let request = LoginRequest {
            username: "admin".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn session_response_uses_camel_case() -> Result<()> {
        let value = serde_json::to_value(SessionResponse {
            username: "admin".to_string(),
            role: "admin".to_string(),
            issued_at: "2026-01-01T00:00:00+00:00".to_string(),
            expires_at: "2026-01-01T01:00:00+00:00".to_string(),
        })?;
        assert!(value.get("issuedAt").is_some());
        assert!(value.get("expiresAt").is_some());
        Ok(())
    }
}
