//! Auth state and configuration.

use std::sync::Arc;
use std::time::Duration;

use super::{credentials::CredentialStore, rate_limit::LoginLimiter, token::TokenCodec};

const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60;
const DEFAULT_LOGIN_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_LOGIN_WINDOW_SECONDS: u64 = 15 * 60;
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_PROTECTED_PREFIX: &str = "/admin";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_ttl_seconds: u64,
    login_max_attempts: u32,
    login_window_seconds: u64,
    cookie_secure: bool,
    login_path: String,
    protected_prefixes: Vec<String>,
    trust_forwarded_for: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            login_max_attempts: DEFAULT_LOGIN_MAX_ATTEMPTS,
            login_window_seconds: DEFAULT_LOGIN_WINDOW_SECONDS,
            cookie_secure: true,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            protected_prefixes: vec![DEFAULT_PROTECTED_PREFIX.to_string()],
            trust_forwarded_for: false,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_login_max_attempts(mut self, attempts: u32) -> Self {
        self.login_max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_login_window_seconds(mut self, seconds: u64) -> Self {
        self.login_window_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: String) -> Self {
        self.login_path = path;
        self
    }

    /// Replace the protected prefixes. Trailing slashes are dropped so `/admin/`
    /// and `/admin` mean the same thing. `/` alone is ignored; it would gate the
    /// public submission endpoint too.
    #[must_use]
    pub fn with_protected_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.protected_prefixes = prefixes
            .into_iter()
            .map(|prefix| prefix.trim().trim_end_matches('/').to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn login_max_attempts(&self) -> u32 {
        self.login_max_attempts
    }

    #[must_use]
    pub fn login_window(&self) -> Duration {
        Duration::from_secs(self.login_window_seconds)
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn protected_prefixes(&self) -> &[String] {
        &self.protected_prefixes
    }

    #[must_use]
    pub fn trust_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }
}

pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
    limiter: LoginLimiter,
    credentials: Arc<dyn CredentialStore>,
}

impl AuthState {
    pub fn new(config: AuthConfig, codec: TokenCodec, credentials: Arc<dyn CredentialStore>) -> Self {
        let limiter = LoginLimiter::new(config.login_max_attempts(), config.login_window());
        Self {
            config,
            codec,
            limiter,
            credentials,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    #[must_use]
    pub fn limiter(&self) -> &LoginLimiter {
        &self.limiter
    }

    pub(super) fn credentials(&self) -> &dyn CredentialStore {
        self.credentials.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::AuthConfig;
    use std::time::Duration;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new();

        assert_eq!(config.session_ttl(), Duration::from_secs(3600));
        assert_eq!(config.login_max_attempts(), 5);
        assert_eq!(config.login_window(), Duration::from_secs(900));
        assert!(config.cookie_secure());
        assert_eq!(config.login_path(), "/login");
        assert_eq!(config.protected_prefixes(), ["/admin".to_string()]);
        assert!(!config.trust_forwarded_for());

        let config = config
            .with_session_ttl_seconds(86_400)
            .with_login_max_attempts(3)
            .with_login_window_seconds(60)
            .with_cookie_secure(false)
            .with_login_path("/signin".to_string())
            .with_protected_prefixes(vec!["/admin/".to_string(), " /ops ".to_string(), "/".to_string()])
            .with_trust_forwarded_for(true);

        assert_eq!(config.session_ttl_seconds(), 86_400);
        assert_eq!(config.login_max_attempts(), 3);
        assert_eq!(config.login_window(), Duration::from_secs(60));
        assert!(!config.cookie_secure());
        assert_eq!(config.login_path(), "/signin");
        assert_eq!(
            config.protected_prefixes(),
            ["/admin".to_string(), "/ops".to_string()]
        );
        assert!(config.trust_forwarded_for());
    }
}
