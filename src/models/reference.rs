// src/models/reference.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'exam_types' table (e.g. "Midterm", "Final").
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamType {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamTypeRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}

/// Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateExamTypeRequest {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
}

/// Paging for `/exam-types`, plus the name fragment for `/exam-types/search`.
#[derive(Debug, Default, Deserialize)]
pub struct ExamTypeQuery {
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
}

/// A topic belongs to a subject.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
    pub subject_id: Option<Uuid>,
}

/// Represents the 'classes' table. Named to avoid the `class` keyword.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SchoolClass {
    pub id: Uuid,
    pub name: String,
}
