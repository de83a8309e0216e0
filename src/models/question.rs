// src/models/question.rs

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Difficulty of a question, stored as the `difficulty_level` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "difficulty_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Low,
    Medium,
    Hard,
}

impl Difficulty {
    /// Every level, in the order buckets are fetched and checked.
    pub const ALL: [Difficulty; 3] = [Difficulty::Low, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Low => "low",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored as the `question_type` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Descriptive,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    pub marks: i32,
    pub difficulty_level: Difficulty,
    pub question_type: QuestionType,
    pub subject_id: Option<Uuid>,
    pub topic_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Insert payload for a question row.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub marks: i32,
    pub difficulty_level: Difficulty,
    pub question_type: QuestionType,
    pub subject_id: Option<Uuid>,
    pub topic_id: Option<Uuid>,
    pub class_id: Option<Uuid>,
}

/// Answer option of a question. Only meaningful for multiple choice.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub option_text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionImage {
    pub id: Uuid,
    pub question_id: Uuid,
    pub image_url: String,
}

/// A question together with its options and images.
/// This is the snapshot carried by every selected question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDetails {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
    pub images: Vec<QuestionImage>,
}

/// Result of the batched secondary lookup, keyed by question id.
#[derive(Debug, Clone, Default)]
pub struct QuestionExtras {
    pub options: HashMap<Uuid, Vec<QuestionOption>>,
    pub images: HashMap<Uuid, Vec<QuestionImage>>,
}

impl QuestionExtras {
    /// Attaches the matching options and images to `question`.
    pub fn attach(&mut self, question: Question) -> QuestionDetails {
        let options = self.options.remove(&question.id).unwrap_or_default();
        let images = self.images.remove(&question.id).unwrap_or_default();
        QuestionDetails {
            question,
            options,
            images,
        }
    }
}

/// Conjunctive filter over question attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionCriteria {
    pub subject_id: Uuid,
    pub class_id: Uuid,
    pub marks: i32,
    /// Empty means any topic.
    pub topic_ids: Vec<Uuid>,
    pub question_type: Option<QuestionType>,
    pub difficulty: Option<Difficulty>,
    /// Questions already taken by earlier sections of the same paper.
    pub exclude_ids: Vec<Uuid>,
}

impl QuestionCriteria {
    pub fn matches(&self, question: &Question) -> bool {
        question.subject_id == Some(self.subject_id)
            && question.class_id == Some(self.class_id)
            && question.marks == self.marks
            && self
                .question_type
                .is_none_or(|qt| question.question_type == qt)
            && self
                .difficulty
                .is_none_or(|d| question.difficulty_level == d)
            && (self.topic_ids.is_empty()
                || question
                    .topic_id
                    .is_some_and(|topic| self.topic_ids.contains(&topic)))
            && !self.exclude_ids.contains(&question.id)
    }

    pub fn with_difficulty(&self, difficulty: Difficulty) -> Self {
        Self {
            difficulty: Some(difficulty),
            ..self.clone()
        }
    }
}

/// Short form of a question used when listing section contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: Uuid,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
}

impl From<&Question> for QuestionSummary {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            text: question.question_text.clone(),
            question_type: question.question_type,
        }
    }
}
