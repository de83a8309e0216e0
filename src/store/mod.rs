// src/store/mod.rs

//! Storage collaborators consumed by the services.
//!
//! Every method that writes more than one row is atomic: either all rows are
//! written or removed, or none are. Uniqueness of section numbers per paper and
//! of question ids / question numbers per section is enforced here as the
//! authoritative guard; services only pre-check for friendlier errors.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        exam_paper::{ExamPaper, ExamPaperFilter, NewExamPaper, UpdateExamPaperRequest},
        question::{Question, QuestionCriteria, QuestionExtras},
        reference::{ExamType, SchoolClass, Subject, Topic},
        section::{ExamPaperSection, GeneratedSection, NewSection, NewSectionQuestion, SectionQuestion},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Conjunctive filter, bounded by `limit`.
    async fn filter_questions(
        &self,
        criteria: &QuestionCriteria,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Question>, AppError>;

    /// Batched secondary lookup of options and images.
    async fn options_and_images(&self, question_ids: &[Uuid]) -> Result<QuestionExtras, AppError>;

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError>;

    /// Questions for the given ids; missing ids are skipped.
    async fn find_questions(&self, ids: &[Uuid]) -> Result<Vec<Question>, AppError>;
}

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn find_exam_type(&self, id: Uuid) -> Result<Option<ExamType>, AppError>;
    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>, AppError>;
    async fn find_class(&self, id: Uuid) -> Result<Option<SchoolClass>, AppError>;
    async fn find_topic(&self, id: Uuid) -> Result<Option<Topic>, AppError>;

    /// Ordered by name. `name` is a case-insensitive fragment.
    async fn list_exam_types(
        &self,
        name: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamType>, AppError>;

    async fn create_exam_type(&self, name: &str) -> Result<ExamType, AppError>;

    async fn update_exam_type(&self, id: Uuid, name: &str) -> Result<Option<ExamType>, AppError>;

    /// `false` when absent. A type still used by an exam paper is a conflict.
    async fn delete_exam_type(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ExamPaperStore: Send + Sync {
    async fn find_exam_paper(&self, id: Uuid) -> Result<Option<ExamPaper>, AppError>;

    async fn list_exam_papers(
        &self,
        filter: &ExamPaperFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamPaper>, AppError>;

    /// Writes the paper, its sections and every question association atomically.
    async fn create_exam_paper_with_sections(
        &self,
        paper: NewExamPaper,
        sections: Vec<GeneratedSection>,
    ) -> Result<ExamPaper, AppError>;

    /// Applies the fields present in `changes` and bumps `updated_at`.
    async fn update_exam_paper(
        &self,
        id: Uuid,
        changes: &UpdateExamPaperRequest,
    ) -> Result<Option<ExamPaper>, AppError>;

    /// Deletes the paper with its sections and associations. `false` when absent.
    async fn delete_exam_paper(&self, id: Uuid) -> Result<bool, AppError>;

    async fn create_section(
        &self,
        exam_paper_id: Uuid,
        section: NewSection,
    ) -> Result<ExamPaperSection, AppError>;

    async fn update_section(
        &self,
        section_id: Uuid,
        section: NewSection,
    ) -> Result<Option<ExamPaperSection>, AppError>;

    /// Ordered by section number.
    async fn sections_by_paper_id(&self, exam_paper_id: Uuid) -> Result<Vec<ExamPaperSection>, AppError>;

    async fn find_section(&self, section_id: Uuid) -> Result<Option<ExamPaperSection>, AppError>;

    /// Deletes the section's associations, then the section. `false` when absent.
    async fn delete_section_cascade(&self, section_id: Uuid) -> Result<bool, AppError>;

    /// Ordered by question number.
    async fn questions_in_section(&self, section_id: Uuid) -> Result<Vec<SectionQuestion>, AppError>;

    async fn find_section_question(&self, id: Uuid) -> Result<Option<SectionQuestion>, AppError>;

    async fn add_question_associations(
        &self,
        section_id: Uuid,
        rows: Vec<NewSectionQuestion>,
    ) -> Result<Vec<SectionQuestion>, AppError>;

    async fn remove_question_from_section(
        &self,
        section_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<SectionQuestion>, AppError>;

    async fn remove_section_question(&self, id: Uuid) -> Result<Option<SectionQuestion>, AppError>;

    async fn update_section_question(
        &self,
        id: Uuid,
        question_number: i32,
        is_optional: bool,
    ) -> Result<Option<SectionQuestion>, AppError>;

    /// Applies every `(association id, new number)` pair in one transaction.
    async fn reassign_question_numbers(
        &self,
        section_id: Uuid,
        rows: Vec<(Uuid, i32)>,
    ) -> Result<(), AppError>;
}
