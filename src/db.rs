use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

/// Failure of a store call, classified by what the caller can do about it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the row.
    #[error("duplicate value for {0}")]
    Duplicate(String),
    /// The database refused the row for another reason (foreign key, length, ...).
    #[error("row rejected: {0}")]
    Rejected(String),
    /// The database could not be reached or the query failed outright.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.constraint().unwrap_or("unique key").to_string())
            }
            sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
            _ => StoreError::Unavailable(e.to_string()),
        }
    }
}

/// Postgres-backed implementation of the credential and expense stores.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("connect to database")
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        email VARCHAR(100) NOT NULL UNIQUE,
        username VARCHAR(50) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        amount NUMERIC(10, 2) NOT NULL,
        date DATE NOT NULL,
        category VARCHAR(50),
        description TEXT
    )
    "#,
    // older deployments created the table without this column
    "ALTER TABLE expenses ADD COLUMN IF NOT EXISTS description TEXT",
    // usernames are unique and looked up ignoring case; display case is kept
    "CREATE UNIQUE INDEX IF NOT EXISTS users_username_lower_key ON users (LOWER(username))",
];

/// Create the `users` and `expenses` tables if they are missing.
///
/// Safe to run on every startup.
pub async fn ensure_schema(db: &PgPool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(db)
            .await
            .with_context(|| format!("apply schema statement: {}", statement.trim()))?;
    }
    info!("database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_unavailable() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn schema_declares_cascading_foreign_key() {
        let expenses = SCHEMA[1];
        assert!(expenses.contains("REFERENCES users(id) ON DELETE CASCADE"));
        assert!(SCHEMA.iter().all(|s| s.contains("IF NOT EXISTS")));
    }

    #[test]
    fn schema_folds_username_case() {
        assert!(SCHEMA
            .iter()
            .any(|s| s.contains("UNIQUE INDEX") && s.contains("LOWER(username)")));
    }
}
