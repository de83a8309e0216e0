// src/models/exam_paper.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::section::SectionWithQuestions;

/// Represents the 'exam_papers' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamPaper {
    pub id: Uuid,
    pub title: String,
    pub exam_type_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    pub total_marks: i32,
    pub duration_minutes: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Insert payload for an exam paper row.
#[derive(Debug, Clone)]
pub struct NewExamPaper {
    pub title: String,
    pub exam_type_id: Uuid,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    pub total_marks: i32,
    pub duration_minutes: i32,
}

/// Request body for creating an empty exam paper; sections are added later.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExamPaperRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub exam_type_id: Uuid,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    #[validate(range(min = 0))]
    pub total_marks: i32,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
}

impl From<CreateExamPaperRequest> for NewExamPaper {
    fn from(req: CreateExamPaperRequest) -> Self {
        Self {
            title: req.title,
            exam_type_id: req.exam_type_id,
            subject_id: req.subject_id,
            class_id: req.class_id,
            total_marks: req.total_marks,
            duration_minutes: req.duration_minutes,
        }
    }
}

/// Partial update. Only the references that are present get re-validated.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateExamPaperRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub exam_type_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub total_marks: Option<i32>,
    #[validate(range(min = 1))]
    pub duration_minutes: Option<i32>,
}

/// Query parameters for `/exam-papers/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExamPaperSearch {
    pub title: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for listing exam papers. All filters are conjunctive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamPaperFilter {
    /// Case-insensitive fragment of the title.
    pub title: Option<String>,
    pub exam_type_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    pub min_total_marks: Option<i32>,
    pub max_total_marks: Option<i32>,
    pub min_duration_minutes: Option<i32>,
    pub max_duration_minutes: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ExamPaperFilter {
    pub fn matches(&self, paper: &ExamPaper) -> bool {
        self.title.as_deref().is_none_or(|fragment| {
            paper.title.to_lowercase().contains(&fragment.to_lowercase())
        }) && self.exam_type_id.is_none_or(|id| paper.exam_type_id == Some(id))
            && self.subject_id.is_none_or(|id| paper.subject_id == Some(id))
            && self.class_id.is_none_or(|id| paper.class_id == Some(id))
            && self.min_total_marks.is_none_or(|m| paper.total_marks >= m)
            && self.max_total_marks.is_none_or(|m| paper.total_marks <= m)
            && self
                .min_duration_minutes
                .is_none_or(|m| paper.duration_minutes >= m)
            && self
                .max_duration_minutes
                .is_none_or(|m| paper.duration_minutes <= m)
    }
}

/// An exam paper with its sections and their questions, in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamPaperDetail {
    #[serde(flatten)]
    pub paper: ExamPaper,
    pub sections: Vec<SectionWithQuestions>,
}
