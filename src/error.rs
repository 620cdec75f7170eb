use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::{auth::services::AuthError, expenses::services::ExpenseError};

const INTERNAL_MESSAGE: &str = "Internal server error";
pub(crate) const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Error returned from HTTP handlers. The message is what the client sees.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Swap the text of a 401 for a route-specific one. Other errors pass through.
    pub fn login_required(self, message: &str) -> Self {
        match self {
            AppError::Unauthorized(_) => AppError::Unauthorized(message.into()),
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Internal => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        };
        (self.status(), Json(json!({ "message": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "malformed request body");
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingFields => {
                AppError::BadRequest("Email, username and password are required.".into())
            }
            AuthError::EmailTaken => AppError::Conflict("User already exists".into()),
            AuthError::Rejected(_) => AppError::BadRequest("Could not create user".into()),
            AuthError::UnknownUser => AppError::BadRequest(INVALID_CREDENTIALS.into()),
            AuthError::WrongPassword => AppError::Unauthorized(INVALID_CREDENTIALS.into()),
            AuthError::Unauthenticated => {
                AppError::Unauthorized("You must be logged in.".into())
            }
            AuthError::Store(_) | AuthError::Session(_) | AuthError::Hash(_) => {
                error!(error = %e, "auth request failed");
                AppError::Internal
            }
        }
    }
}

impl From<ExpenseError> for AppError {
    fn from(e: ExpenseError) -> Self {
        match e {
            ExpenseError::MissingFields => {
                AppError::BadRequest("Amount, date, and category are required.".into())
            }
            ExpenseError::InvalidDate(_) => {
                AppError::BadRequest("Date must be formatted as YYYY-MM-DD.".into())
            }
            ExpenseError::Store(_) => {
                error!(error = %e, "expense request failed");
                AppError::Internal
            }
        }
    }
}
