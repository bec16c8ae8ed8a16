//! Postgres access for job applications.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{ApplicationRecord, NewApplication};

#[derive(Debug, PartialEq, Eq)]
pub(super) enum InsertOutcome {
    Created(Uuid),
    /// An application with the same email already exists.
    Conflict,
}

pub(super) async fn insert_application(
    pool: &PgPool,
    application: &NewApplication,
) -> Result<InsertOutcome> {
    let query = r"
        INSERT INTO applications
            (full_name, email, phone, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(&application.full_name)
        .bind(&application.email)
        .bind(&application.phone)
        .bind(&application.description)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertOutcome::Created(row.try_get("id")?)),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert application"),
    }
}

/// All applications, newest first.
pub(super) async fn list_applications(pool: &PgPool) -> Result<Vec<ApplicationRecord>> {
    let query = r"
        SELECT id, full_name, email, phone, description, created_at
        FROM applications
        ORDER BY created_at DESC, id DESC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list applications")?;

    rows.into_iter()
        .map(|row| -> Result<ApplicationRecord> {
            Ok(ApplicationRecord {
                id: row.try_get("id")?,
                full_name: row.try_get("full_name")?,
                email: row.try_get("email")?,
                phone: row.try_get("phone")?,
                description: row.try_get("description")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

/// Delete one application; `false` when nothing matched.
pub(super) async fn delete_application(pool: &PgPool, id: Uuid) -> Result<bool> {
    let query = "DELETE FROM applications WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete application")?;

    Ok(result.rows_affected() > 0)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
