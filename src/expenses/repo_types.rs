use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::Date;

use crate::auth::repo_types::UserId;

/// Expense record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Expense {
    pub id: i64,
    pub user_id: UserId,
    pub amount: Decimal,
    pub date: Date,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// A validated expense ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: Decimal,
    pub date: Date,
    pub category: String,
    pub description: Option<String>,
}
