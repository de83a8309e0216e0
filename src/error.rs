// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::question::Difficulty;

/// Global Application Error Enum.
/// Every service returns this; the router maps it onto HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 400 Bad Request
    #[error("{0}")]
    Validation(String),

    // 409 Conflict (duplicate section number, question, question number)
    #[error("{0}")]
    Conflict(String),

    // 400 Bad Request, the candidate pool cannot satisfy a section
    #[error("{}", insufficient_message(.section, .difficulty, .required, .available))]
    InsufficientQuestions {
        section: String,
        difficulty: Option<Difficulty>,
        required: usize,
        available: usize,
    },

    // 500 Internal Server Error
    #[error("{0}")]
    Internal(String),
}

fn insufficient_message(
    section: &str,
    difficulty: &Option<Difficulty>,
    required: &usize,
    available: &usize,
) -> String {
    match difficulty {
        Some(level) => format!(
            "Not enough {} difficulty questions for section \"{}\". Required: {}, Available: {}",
            level, section, required, available
        ),
        None => format!(
            "Not enough questions available for section \"{}\". Required: {}, Available: {}",
            section, required, available
        ),
    }
}

impl AppError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} with ID {} not found", entity, id))
    }
}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InsufficientQuestions { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal Server Error" })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Converts `sqlx::Error` so `?` works on database queries.
/// Constraint violations keep their meaning: the storage layer is the final
/// guard for uniqueness and referential integrity.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(match db_err.constraint() {
                    Some(constraint) => format!("Duplicate value violates {}", constraint),
                    None => "Duplicate value".to_string(),
                });
            }
            if db_err.is_foreign_key_violation() {
                return AppError::NotFound(format!("Referenced entity not found: {}", db_err));
            }
            if db_err.is_check_violation() {
                return AppError::Validation(match db_err.constraint() {
                    Some(constraint) => format!("Value violates {}", constraint),
                    None => "Value violates a check constraint".to_string(),
                });
            }
        }
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error as StdError, fmt};

    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[derive(Debug)]
    struct CheckViolation;

    impl fmt::Display for CheckViolation {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("new row violates check constraint")
        }
    }

    impl StdError for CheckViolation {}

    impl DatabaseError for CheckViolation {
        fn message(&self) -> &str {
            "new row violates check constraint"
        }

        fn constraint(&self) -> Option<&str> {
            Some("exam_paper_sections_answer_le_total")
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::CheckViolation
        }
    }

    #[test]
    fn check_violation_is_a_validation_error() {
        let err = AppError::from(sqlx::Error::Database(Box::new(CheckViolation)));
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("exam_paper_sections_answer_le_total"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn row_not_found_stays_internal() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Internal(_)));
    }
}
