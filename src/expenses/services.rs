use time::{macros::format_description, Date};
use tracing::info;

use crate::{
    auth::session::SessionUser,
    db::StoreError,
    expenses::{
        dto::AddExpenseRequest,
        repo::ExpenseStore,
        repo_types::{Expense, NewExpense},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error("amount, date and category are required")]
    MissingFields,
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Check a request and turn it into a storable expense.
///
/// A zero amount and empty strings count as missing.
pub fn validate(req: AddExpenseRequest) -> Result<NewExpense, ExpenseError> {
    let amount = req
        .amount
        .filter(|a| !a.is_zero())
        .ok_or(ExpenseError::MissingFields)?;
    let date = non_empty(req.date).ok_or(ExpenseError::MissingFields)?;
    let category = non_empty(req.category).ok_or(ExpenseError::MissingFields)?;

    let date = Date::parse(date.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ExpenseError::InvalidDate(date))?;

    Ok(NewExpense {
        amount,
        date,
        category,
        description: non_empty(req.description),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn add_expense(
    expenses: &dyn ExpenseStore,
    user: &SessionUser,
    req: AddExpenseRequest,
) -> Result<Expense, ExpenseError> {
    let expense = validate(req)?;
    let stored = expenses.insert(user.id, expense).await?;
    info!(user_id = %user.id, expense_id = stored.id, "expense added");
    Ok(stored)
}

pub async fn list_expenses(
    expenses: &dyn ExpenseStore,
    user: &SessionUser,
) -> Result<Vec<Expense>, ExpenseError> {
    Ok(expenses.list_by_user(user.id).await?)
}
