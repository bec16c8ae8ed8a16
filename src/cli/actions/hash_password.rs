use crate::api::handlers::auth::{hash_password, validate_new_password};
use anyhow::{Result, anyhow};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct Args {
    pub password: SecretString,
}

/// Print an Argon2id hash for the password, ready for the `admins` table.
/// # Errors
/// Returns an error if the password is out of bounds or hashing fails.
pub fn execute(args: &Args) -> Result<()> {
    let hash = hash(&args.password)?;
    println!("{hash}");
    Ok(())
}

fn hash(password: &SecretString) -> Result<String> {
    validate_new_password(password.expose_secret()).map_err(|err| anyhow!(err))?;
    hash_password(password.expose_secret()).map_err(|err| anyhow!("failed to hash password: {err}"))
}
