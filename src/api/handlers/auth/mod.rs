//! Administrator authentication and request gating.
//!
//! A single administrator logs in with a username and password stored in the
//! `admins` table. A successful login yields a signed, short-lived session
//! token in the `admin_token` cookie; nothing about the session is stored
//! server-side. Every request then passes through the gate, which allows
//! public paths and demands a valid admin token for protected ones.
//!
//! ## Login throttling
//!
//! Login attempts are limited per client (peer address, or the first
//! `X-Forwarded-For` hop when a trusted proxy is configured).
//!
//! - **Attempt Limit:** 5 failures per client within 15 minutes (configurable).
//! - **Reset:** a successful login clears the client's history.
//! - **Scope:** in-process memory only; restarts forget all counters.

mod credentials;
mod error;
pub(crate) mod gate;
pub(crate) mod login;
mod password;
mod rate_limit;
pub(crate) mod session;
mod state;
mod token;
pub(crate) mod types;
mod utils;

pub use credentials::{
    ADMIN_ROLE, AdministratorRecord, CredentialStore, PgCredentialStore, StorageError,
};
pub use error::AuthError;
pub use gate::{AdminIdentity, GateDecision, request_gate};
pub use password::{hash_password, verify as verify_password};
pub use rate_limit::{AttemptPermit, LoginLimiter, RateLimited};
pub use state::{AuthConfig, AuthState};
pub use token::{MIN_SECRET_BYTES, SessionClaims, TokenCodec, TokenError};
pub use utils::{
    ClientId, SESSION_COOKIE_NAME, validate_login_input, validate_new_credentials,
    validate_new_password,
};
