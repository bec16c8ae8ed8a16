//! Map validated CLI matches to the action to run.

use crate::cli::actions::{Action, create_admin, hash_password, server};
use crate::cli::commands::{
    self, ARG_DSN, ARG_FORCE, ARG_PASSWORD, ARG_PORT, ARG_USERNAME, CMD_CREATE_ADMIN,
    CMD_HASH_PASSWORD, CMD_SERVE,
};
use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_SERVE, sub_m)) => serve(sub_m),
        Some((CMD_HASH_PASSWORD, sub_m)) => Ok(Action::HashPassword(hash_password::Args {
            password: required_secret(sub_m, ARG_PASSWORD)?,
        })),
        Some((CMD_CREATE_ADMIN, sub_m)) => Ok(Action::CreateAdmin(create_admin::Args {
            dsn: required(sub_m, ARG_DSN)?,
            username: required(sub_m, ARG_USERNAME)?,
            password: required_secret(sub_m, ARG_PASSWORD)?,
            force: sub_m.get_flag(ARG_FORCE),
        })),
        Some((other, _)) => Err(anyhow!("unknown subcommand: {other}")),
        None => Err(anyhow!("missing subcommand")),
    }
}

fn serve(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = required(matches, ARG_DSN)?;
    let auth_opts = commands::auth::Options::parse(matches)?;

    Ok(Action::Server(server::Args {
        port,
        dsn,
        jwt_secret: auth_opts.jwt_secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        login_max_attempts: auth_opts.login_max_attempts,
        login_window_seconds: auth_opts.login_window_seconds,
        cookie_secure: auth_opts.cookie_secure,
        protected_prefixes: auth_opts.protected_prefixes,
        login_path: auth_opts.login_path,
        trust_forwarded_for: auth_opts.trust_forwarded_for,
    }))
}

fn required(matches: &clap::ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .with_context(|| format!("missing required argument: --{id}"))
}

fn required_secret(matches: &clap::ArgMatches, id: &str) -> Result<SecretString> {
    matches
        .get_one::<String>(id)
        .filter(|value| !value.is_empty())
        .map(|value| SecretString::from(value.clone()))
        .with_context(|| format!("missing required argument: --{id}"))
}
