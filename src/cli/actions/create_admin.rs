use crate::api::handlers::auth::{ADMIN_ROLE, hash_password, validate_new_credentials};
use anyhow::{Context, Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{Instrument, info, warn};

pub const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub username: String,
    pub password: SecretString,
    pub force: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Created,
    Replaced,
    Kept,
}

/// Apply the schema and store the administrator record.
/// # Errors
/// Returns an error if the input is invalid or the database is unreachable.
pub async fn execute(args: Args) -> Result<()> {
    validate_new_credentials(&args.username, args.password.expose_secret())
        .map_err(|err| anyhow!(err))?;
    let username = args.username.trim();

    let password_hash = hash_password(args.password.expose_secret())
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&args.dsn)
        .await
        .context("Failed to connect to database")?;

    apply_schema(&pool).await?;

    match upsert_admin(&pool, username, &password_hash, args.force).await? {
        Outcome::Created => info!("Created administrator {username}"),
        Outcome::Replaced => info!("Replaced password for administrator {username}"),
        Outcome::Kept => {
            warn!("Administrator {username} already exists; pass --force to replace it");
            return Err(anyhow!(
                "administrator {username} already exists (use --force to replace the password)"
            ));
        }
    }

    println!("administrator {username} ready");
    Ok(())
}

async fn apply_schema(pool: &PgPool) -> Result<()> {
    let span = tracing::info_span!("db.query", db.system = "postgresql", db.operation = "DDL");
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to apply schema")?;
    Ok(())
}

async fn upsert_admin(
    pool: &PgPool,
    username: &str,
    password_hash: &str,
    force: bool,
) -> Result<Outcome> {
    let query = if force {
        r"
            INSERT INTO admins (username, password_hash, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO UPDATE
                SET password_hash = EXCLUDED.password_hash
            RETURNING (xmax = 0) AS inserted
        "
    } else {
        r"
            INSERT INTO admins (username, password_hash, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            RETURNING TRUE AS inserted
        "
    };
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.sql.table = "admins"
    );
    let inserted: Option<bool> = sqlx::query_scalar(query)
        .bind(username)
        .bind(password_hash)
        .bind(ADMIN_ROLE)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to store administrator")?;

    Ok(outcome(inserted))
}

fn outcome(inserted: Option<bool>) -> Outcome {
    match inserted {
        Some(true) => Outcome::Created,
        Some(false) => Outcome::Replaced,
        None => Outcome::Kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_defines_both_tables() {
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS admins"));
        assert!(SCHEMA_SQL.contains("CREATE TABLE IF NOT EXISTS applications"));
        assert!(SCHEMA_SQL.contains("applications_email_key"));
    }

    #[test]
    fn outcome_from_returning_row() {
        assert_eq!(outcome(Some(true)), Outcome::Created);
        assert_eq!(outcome(Some(false)), Outcome::Replaced);
        assert_eq!(outcome(None), Outcome::Kept);
    }

    #[tokio::test]
    async fn invalid_credentials_fail_before_connecting() {
        let result = execute(Args {
            dsn: "postgres://hiregate@127.0.0.1:1/hiregate".to_string(),
            username: "ab".to_string(),
            password: SecretString::from("correct-horse-battery".to_string()),
            force: false,
        })
        .await;
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("Username"));
        }
    }
}
