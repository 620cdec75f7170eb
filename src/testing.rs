//! In-memory stores for tests. They enforce the same rules as the SQL schema:
//! unique email and username, and expenses must reference an existing user.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::auth::{
    repo::CredentialStore,
    repo_types::{User, UserId},
};
use crate::db::StoreError;
use crate::expenses::{
    repo::ExpenseStore,
    repo_types::{Expense, NewExpense},
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    expenses: Mutex<Vec<Expense>>,
    unavailable: bool,
}

impl MemoryStore {
    /// A store whose every call fails as if the database were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

/// Mirrors the `LOWER(username)` unique index.
fn same_username(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| same_username(&u.username, username)).cloned())
    }

    async fn insert(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(StoreError::Duplicate("users_email_key".into()));
        }
        if users.iter().any(|u| same_username(&u.username, username)) {
            return Err(StoreError::Duplicate("users_username_key".into()));
        }
        let user = User {
            id: UserId(users.len() as i64 + 1),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn insert(&self, user_id: UserId, expense: NewExpense) -> Result<Expense, StoreError> {
        self.check()?;
        if !self.users.lock().unwrap().iter().any(|u| u.id == user_id) {
            return Err(StoreError::Rejected(
                "insert or update on table \"expenses\" violates foreign key constraint".into(),
            ));
        }

        // NUMERIC(10, 2)
        let mut amount = expense.amount.round_dp(2);
        amount.rescale(2);

        let mut expenses = self.expenses.lock().unwrap();
        let row = Expense {
            id: expenses.len() as i64 + 1,
            user_id,
            amount,
            date: expense.date,
            category: Some(expense.category),
            description: expense.description,
        };
        expenses.push(row.clone());
        Ok(row)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Expense>, StoreError> {
        self.check()?;
        let expenses = self.expenses.lock().unwrap();
        Ok(expenses
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}
