use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request body for adding an expense. Every field is optional here so that
/// missing values are reported as a validation error rather than a parse
/// failure.
#[derive(Debug, Default, Deserialize)]
pub struct AddExpenseRequest {
    pub amount: Option<Decimal>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
