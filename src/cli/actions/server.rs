use crate::api::{self, handlers::auth::AuthConfig};
use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub session_ttl_seconds: u64,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub cookie_secure: bool,
    pub protected_prefixes: Vec<String>,
    pub login_path: String,
    pub trust_forwarded_for: bool,
}

// DSN and secret stay out of debug output.
impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("login_max_attempts", &self.login_max_attempts)
            .field("login_window_seconds", &self.login_window_seconds)
            .field("cookie_secure", &self.cookie_secure)
            .field("protected_prefixes", &self.protected_prefixes)
            .field("login_path", &self.login_path)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .finish_non_exhaustive()
    }
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::new()
            .with_session_ttl_seconds(self.session_ttl_seconds)
            .with_login_max_attempts(self.login_max_attempts)
            .with_login_window_seconds(self.login_window_seconds)
            .with_cookie_secure(self.cookie_secure)
            .with_protected_prefixes(self.protected_prefixes.clone())
            .with_login_path(self.login_path.clone())
            .with_trust_forwarded_for(self.trust_forwarded_for)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing key is unusable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let auth_config = args.auth_config();

    api::new(args.port, args.dsn, args.jwt_secret, auth_config).await
}
