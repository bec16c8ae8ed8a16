//! # Hiregate
//!
//! `hiregate` takes job applications from the public and lets a single
//! administrator review and delete them.
//!
//! ## Public surface
//!
//! - `POST /api/submit` stores an application.
//! - `POST /login` and `POST /logout` manage the administrator session.
//! - `GET /health` reports build info and database reachability.
//!
//! ## Administration (`/admin/*`)
//!
//! Every request under a protected prefix passes through the request gate
//! before any handler runs. The gate reads the `admin_token` cookie, verifies
//! the signed session token (HS256 JWT, server-side secret, fixed lifetime) and
//! either forwards the identity claims to the handler or redirects to the login
//! path with the original path preserved in `from`.
//!
//! ## Login throttling
//!
//! Failed logins are counted per client identifier in process memory. Once the
//! configured threshold is reached inside the window, further attempts get
//! `429 Too Many Requests` without touching the credential store. The counters
//! do not survive a restart and are not shared between processes.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
