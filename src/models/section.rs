// src/models/section.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::question::QuestionSummary;

/// Represents the 'exam_paper_sections' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamPaperSection {
    pub id: Uuid,
    pub exam_paper_id: Uuid,
    /// Display order, unique within the paper.
    pub section_number: i32,
    pub title: String,
    pub instructions: Option<String>,
    pub marks_per_question: i32,
    /// How many questions students must answer.
    pub questions_to_answer: i32,
    /// How many questions are offered, including extra choices.
    pub total_questions: i32,
    /// Always `marks_per_question × questions_to_answer`.
    pub section_marks: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Fully resolved section values, ready to be written.
/// `section_marks` is derived, never supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection {
    pub section_number: i32,
    pub title: String,
    pub instructions: Option<String>,
    pub marks_per_question: i32,
    pub questions_to_answer: i32,
    pub total_questions: i32,
}

impl NewSection {
    pub fn section_marks(&self) -> i32 {
        self.marks_per_question * self.questions_to_answer
    }
}

impl From<&ExamPaperSection> for NewSection {
    fn from(section: &ExamPaperSection) -> Self {
        Self {
            section_number: section.section_number,
            title: section.title.clone(),
            instructions: section.instructions.clone(),
            marks_per_question: section.marks_per_question,
            questions_to_answer: section.questions_to_answer,
            total_questions: section.total_questions,
        }
    }
}

/// DTO for creating a section on an existing exam paper.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateSectionRequest {
    pub section_number: i32,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub instructions: Option<String>,
    pub marks_per_question: i32,
    pub questions_to_answer: i32,
    pub total_questions: i32,
}

/// DTO for updating a section. Fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateSectionRequest {
    pub section_number: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub instructions: Option<String>,
    pub marks_per_question: Option<i32>,
    pub questions_to_answer: Option<i32>,
    pub total_questions: Option<i32>,
}

/// Represents the 'exam_paper_questions' junction table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SectionQuestion {
    pub id: Uuid,
    pub section_id: Uuid,
    pub question_id: Uuid,
    /// Unique within the section.
    pub question_number: i32,
    /// One of the extra choices beyond `questions_to_answer`.
    pub is_optional: bool,
}

/// Insert payload for a junction row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSectionQuestion {
    pub question_id: Uuid,
    pub question_number: i32,
    pub is_optional: bool,
}

/// DTO for adding a question to a section.
/// The question number is auto-assigned when omitted.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddQuestionRequest {
    pub question_id: Uuid,
    #[validate(range(min = 1))]
    pub question_number: Option<i32>,
    pub is_optional: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddQuestionsRequest {
    #[validate(length(min = 1), nested)]
    pub questions: Vec<AddQuestionRequest>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct UpdateSectionQuestionRequest {
    #[validate(range(min = 1))]
    pub question_number: Option<i32>,
    pub is_optional: Option<bool>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct QuestionOrder {
    pub association_id: Uuid,
    pub new_question_number: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ReorderQuestionsRequest {
    #[validate(length(min = 1))]
    pub orders: Vec<QuestionOrder>,
}

/// A junction row joined with a summary of its question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionQuestionView {
    pub id: Uuid,
    pub question_number: i32,
    pub is_optional: bool,
    pub question: Option<QuestionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionWithQuestions {
    #[serde(flatten)]
    pub section: ExamPaperSection,
    pub questions: Vec<SectionQuestionView>,
}

/// A section produced by generation, written together with its paper.
#[derive(Debug, Clone)]
pub struct GeneratedSection {
    pub section: NewSection,
    pub questions: Vec<NewSectionQuestion>,
}
