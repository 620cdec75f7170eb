use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{field, instrument, Span};

use super::{
    dto::{AddExpenseRequest, MessageResponse},
    repo_types::Expense,
    services,
};
use crate::{auth::extractors::AuthUser, error::AppError, state::AppState};

pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/api/expense/add", post(add_expense))
        .route("/api/expenses", get(list_expenses))
}

const ADD_REQUIRES_LOGIN: &str = "You must be logged in to add an expense.";
const LIST_REQUIRES_LOGIN: &str = "You must be logged in to view the expenses.";

/// The session is checked before the body is looked at, so an anonymous
/// request is always a 401.
#[instrument(skip_all, fields(user_id))]
pub async fn add_expense(
    State(state): State<AppState>,
    user: Result<AuthUser, AppError>,
    payload: Result<Json<AddExpenseRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let AuthUser(user) = user.map_err(|e| e.login_required(ADD_REQUIRES_LOGIN))?;
    Span::current().record("user_id", field::display(user.id));
    let Json(payload) = payload?;
    services::add_expense(state.expenses.as_ref(), &user, payload).await?;
    Ok(Json(MessageResponse {
        message: "Expense added successfully.",
    }))
}

#[instrument(skip_all, fields(user_id))]
pub async fn list_expenses(
    State(state): State<AppState>,
    user: Result<AuthUser, AppError>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let AuthUser(user) = user.map_err(|e| e.login_required(LIST_REQUIRES_LOGIN))?;
    Span::current().record("user_id", field::display(user.id));
    let expenses = services::list_expenses(state.expenses.as_ref(), &user).await?;
    Ok(Json(expenses))
}
