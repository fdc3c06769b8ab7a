//! Validation error types

use crate::constants::{Operator, TestType};
use thiserror::Error;

/// Raised synchronously when a filter edit does not fit the active schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown test type: {0}")]
    UnknownTestType(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} is not available for {test_type} tests")]
    FieldNotInSchema { field: String, test_type: TestType },

    #[error("Operator {operator} is not allowed on field {field}")]
    OperatorNotAllowed { field: String, operator: Operator },

    #[error("Invalid ping result {0:?}: expected any, up or down")]
    InvalidPingResult(String),

    #[error("Malformed filter {0:?}: expected KEY=VALUE")]
    MalformedFilter(String),
}
