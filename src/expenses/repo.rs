use async_trait::async_trait;

use crate::auth::repo_types::UserId;
use crate::db::{PgStore, StoreError};
use crate::expenses::repo_types::{Expense, NewExpense};

/// Persistence for expenses. Every row belongs to exactly one user.
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    async fn insert(&self, user_id: UserId, expense: NewExpense) -> Result<Expense, StoreError>;

    /// All of `user_id`'s expenses in insertion order.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Expense>, StoreError>;
}

#[async_trait]
impl ExpenseStore for PgStore {
    async fn insert(&self, user_id: UserId, expense: NewExpense) -> Result<Expense, StoreError> {
        let row = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (user_id, amount, date, category, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, amount, date, category, description
            "#,
        )
        .bind(user_id)
        .bind(expense.amount)
        .bind(expense.date)
        .bind(expense.category)
        .bind(expense.description)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Expense>, StoreError> {
        let rows = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, user_id, amount, date, category, description
            FROM expenses
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
