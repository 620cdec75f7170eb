use async_trait::async_trait;

use crate::auth::repo_types::User;
use crate::db::{PgStore, StoreError};

/// Persistence for user accounts.
///
/// Implementations must enforce uniqueness of both email and username and
/// report a collision as [`StoreError::Duplicate`]. Usernames compare
/// case-insensitively; emails arrive already lowercased.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn insert(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, password
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}
