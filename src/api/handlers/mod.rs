//! API handlers: administrator auth, job applications and health.

pub mod applications;
pub mod auth;
pub mod health;
