use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_LOGIN_MAX_ATTEMPTS: &str = "login-max-attempts";
pub const ARG_LOGIN_WINDOW_SECONDS: &str = "login-window-seconds";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";
pub const ARG_PROTECTED_PREFIX: &str = "protected-prefix";
pub const ARG_LOGIN_PATH: &str = "login-path";
pub const ARG_TRUST_FORWARDED_FOR: &str = "trust-forwarded-for";

pub struct Options {
    pub jwt_secret: SecretString,
    pub session_ttl_seconds: u64,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub cookie_secure: bool,
    pub protected_prefixes: Vec<String>,
    pub login_path: String,
    pub trust_forwarded_for: bool,
}

// The secret stays out of debug output.
impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
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

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing secret is missing or a value is out of range.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let jwt_secret = match matches.get_one::<String>(ARG_JWT_SECRET) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.clone()),
            _ => bail!("missing required argument: --{ARG_JWT_SECRET}"),
        };

        let session_ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(3600);
        let login_max_attempts = matches
            .get_one::<u32>(ARG_LOGIN_MAX_ATTEMPTS)
            .copied()
            .unwrap_or(5);
        let login_window_seconds = matches
            .get_one::<u64>(ARG_LOGIN_WINDOW_SECONDS)
            .copied()
            .unwrap_or(900);

        if session_ttl_seconds == 0 {
            bail!("--{ARG_SESSION_TTL_SECONDS} must be greater than zero");
        }
        if login_max_attempts == 0 {
            bail!("--{ARG_LOGIN_MAX_ATTEMPTS} must be greater than zero");
        }
        if login_window_seconds == 0 {
            bail!("--{ARG_LOGIN_WINDOW_SECONDS} must be greater than zero");
        }

        let login_path = matches
            .get_one::<String>(ARG_LOGIN_PATH)
            .cloned()
            .unwrap_or_else(|| "/login".to_string());
        if !login_path.starts_with('/') {
            bail!("--{ARG_LOGIN_PATH} must start with '/'");
        }

        let protected_prefixes: Vec<String> = matches
            .get_many::<String>(ARG_PROTECTED_PREFIX)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        if let Some(prefix) = protected_prefixes
            .iter()
            .find(|prefix| !prefix.trim().starts_with('/'))
        {
            bail!("--{ARG_PROTECTED_PREFIX} must start with '/': {prefix}");
        }

        Ok(Self {
            jwt_secret,
            session_ttl_seconds,
            login_max_attempts,
            login_window_seconds,
            cookie_secure: matches
                .get_one::<bool>(ARG_COOKIE_SECURE)
                .copied()
                .unwrap_or(true),
            protected_prefixes,
            login_path,
            trust_forwarded_for: matches.get_flag(ARG_TRUST_FORWARDED_FOR),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_gate_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("Secret used to sign session tokens (at least 32 bytes)")
                .env("HIREGATE_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token and cookie lifetime in seconds")
                .env("HIREGATE_SESSION_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark the session cookie Secure (disable only for plain-HTTP development)")
                .env("HIREGATE_COOKIE_SECURE")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new(ARG_LOGIN_MAX_ATTEMPTS)
                .long(ARG_LOGIN_MAX_ATTEMPTS)
                .help("Failed logins allowed per client within the window")
                .env("HIREGATE_LOGIN_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_LOGIN_WINDOW_SECONDS)
                .long(ARG_LOGIN_WINDOW_SECONDS)
                .help("Login attempt window in seconds")
                .env("HIREGATE_LOGIN_WINDOW_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
}

fn with_gate_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROTECTED_PREFIX)
                .long(ARG_PROTECTED_PREFIX)
                .help("Path prefix that requires an admin session (repeatable)")
                .env("HIREGATE_PROTECTED_PREFIXES")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .default_value("/admin"),
        )
        .arg(
            Arg::new(ARG_LOGIN_PATH)
                .long(ARG_LOGIN_PATH)
                .help("Path unauthenticated requests are redirected to")
                .env("HIREGATE_LOGIN_PATH")
                .default_value("/login"),
        )
        .arg(
            Arg::new(ARG_TRUST_FORWARDED_FOR)
                .long(ARG_TRUST_FORWARDED_FOR)
                .help("Key login throttling on X-Forwarded-For/X-Real-IP (only behind a trusted proxy)")
                .env("HIREGATE_TRUST_FORWARDED_FOR")
                .action(ArgAction::SetTrue),
        )
}
