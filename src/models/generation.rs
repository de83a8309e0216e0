// src/models/generation.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    exam_paper::ExamPaper,
    question::{QuestionDetails, QuestionType},
};

/// Target percentage split of a section's questions.
/// The three values need not sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct DifficultyDistribution {
    #[validate(range(min = 0.0, max = 100.0))]
    pub low: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub medium: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub hard: f64,
}

/// Configuration of one section in a generation request.
/// Exists only for the duration of the request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SectionConfig {
    /// Section label, e.g. "Answer any 5".
    #[validate(length(min = 1, max = 200))]
    pub section: String,

    /// Declared marks for the section. Summed as-is into the paper total.
    #[validate(range(min = 0))]
    pub total_marks: i32,

    #[validate(range(min = 1))]
    pub marks_per_question: i32,

    /// Questions to select, including the extra choices.
    #[validate(range(min = 1))]
    pub total_questions: i32,

    pub question_type: Option<QuestionType>,

    #[validate(nested)]
    pub difficulty_distribution: Option<DifficultyDistribution>,

    #[serde(default)]
    pub topic_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateExamPaperRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub exam_type_id: Uuid,
    pub subject_id: Uuid,
    pub class_id: Uuid,
    #[validate(range(min = 1))]
    pub duration_minutes: i32,
    #[validate(length(min = 1), nested)]
    pub sections: Vec<SectionConfig>,
}

/// Preview request: selects questions for one section without persisting.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateSectionQuestionsRequest {
    pub subject_id: Uuid,
    pub class_id: Uuid,
    #[validate(nested)]
    pub section: SectionConfig,
}

/// A question picked for a section, numbered in final order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedQuestion {
    pub question_id: Uuid,
    pub question_number: i32,
    pub section: String,
    pub question: QuestionDetails,
}

/// A persisted exam paper together with the questions chosen for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedExamPaper {
    #[serde(flatten)]
    pub paper: ExamPaper,
    pub questions: Vec<SelectedQuestion>,
}
