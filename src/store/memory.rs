// src/store/memory.rs

//! In-process store with the same constraints as the Postgres schema.
//!
//! Mutations run against a copy of the data which replaces the original only
//! when every constraint holds, so a failed call leaves the store untouched.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        exam_paper::{ExamPaper, ExamPaperFilter, NewExamPaper, UpdateExamPaperRequest},
        question::{
            NewQuestion, Question, QuestionCriteria, QuestionExtras, QuestionImage, QuestionOption,
        },
        reference::{ExamType, SchoolClass, Subject, Topic},
        section::{
            ExamPaperSection, GeneratedSection, NewSection, NewSectionQuestion, SectionQuestion,
        },
    },
    store::{ExamPaperStore, QuestionStore, ReferenceStore},
};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    exam_types: Vec<ExamType>,
    subjects: Vec<Subject>,
    classes: Vec<SchoolClass>,
    topics: Vec<Topic>,
    questions: Vec<Question>,
    options: Vec<QuestionOption>,
    images: Vec<QuestionImage>,
    papers: Vec<ExamPaper>,
    sections: Vec<ExamPaperSection>,
    section_questions: Vec<SectionQuestion>,
}

/// Mirrors the CHECK constraints on `exam_paper_sections`.
fn check_section_values(section: &NewSection) -> Result<(), AppError> {
    let violated = if section.section_number <= 0 {
        Some("section_number > 0")
    } else if section.marks_per_question <= 0 {
        Some("marks_per_question > 0")
    } else if section.questions_to_answer <= 0 {
        Some("questions_to_answer > 0")
    } else if section.total_questions <= 0 {
        Some("total_questions > 0")
    } else if section.questions_to_answer > section.total_questions {
        Some("questions_to_answer <= total_questions")
    } else {
        None
    };

    match violated {
        Some(check) => Err(AppError::Validation(format!(
            "Section \"{}\" violates {}",
            section.title, check
        ))),
        None => Ok(()),
    }
}

impl MemoryData {
    fn insert_section(&mut self, exam_paper_id: Uuid, section: &NewSection) -> Result<ExamPaperSection, AppError> {
        if !self.papers.iter().any(|p| p.id == exam_paper_id) {
            return Err(AppError::not_found("Exam paper", exam_paper_id));
        }
        check_section_values(section)?;
        if self
            .sections
            .iter()
            .any(|s| s.exam_paper_id == exam_paper_id && s.section_number == section.section_number)
        {
            return Err(AppError::Conflict(format!(
                "Section number {} already exists for this exam paper",
                section.section_number
            )));
        }

        let row = ExamPaperSection {
            id: Uuid::new_v4(),
            exam_paper_id,
            section_number: section.section_number,
            title: section.title.clone(),
            instructions: section.instructions.clone(),
            marks_per_question: section.marks_per_question,
            questions_to_answer: section.questions_to_answer,
            total_questions: section.total_questions,
            section_marks: section.section_marks(),
            created_at: Some(Utc::now()),
        };
        self.sections.push(row.clone());
        Ok(row)
    }

    fn insert_associations(
        &mut self,
        section_id: Uuid,
        rows: &[NewSectionQuestion],
    ) -> Result<Vec<SectionQuestion>, AppError> {
        if !self.sections.iter().any(|s| s.id == section_id) {
            return Err(AppError::not_found("Section", section_id));
        }
        let mut inserted = Vec::with_capacity(rows.len());
        for row in rows {
            if !self.questions.iter().any(|q| q.id == row.question_id) {
                return Err(AppError::not_found("Question", row.question_id));
            }
            let association = SectionQuestion {
                id: Uuid::new_v4(),
                section_id,
                question_id: row.question_id,
                question_number: row.question_number,
                is_optional: row.is_optional,
            };
            self.section_questions.push(association.clone());
            inserted.push(association);
        }
        self.check_section_unique(section_id)?;
        Ok(inserted)
    }

    /// Backstop for UNIQUE(section_id, question_number) and UNIQUE(section_id, question_id).
    fn check_section_unique(&self, section_id: Uuid) -> Result<(), AppError> {
        let mut numbers = HashSet::new();
        let mut questions = HashSet::new();
        for row in self.section_questions.iter().filter(|r| r.section_id == section_id) {
            if !numbers.insert(row.question_number) {
                return Err(AppError::Conflict(format!(
                    "Question number {} already exists in this section",
                    row.question_number
                )));
            }
            if !questions.insert(row.question_id) {
                return Err(AppError::Conflict(format!(
                    "Question {} already exists in this section",
                    row.question_id
                )));
            }
        }
        Ok(())
    }

    fn sorted_section_questions(&self, section_id: Uuid) -> Vec<SectionQuestion> {
        let mut rows: Vec<SectionQuestion> = self
            .section_questions
            .iter()
            .filter(|r| r.section_id == section_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.question_number);
        rows
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against a copy and commits it only on success.
    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut MemoryData) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut guard = self.write();
        let mut working = guard.clone();
        let result = f(&mut working)?;
        *guard = working;
        Ok(result)
    }

    pub fn insert_exam_type(&self, name: &str) -> ExamType {
        let row = ExamType {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.write().exam_types.push(row.clone());
        row
    }

    pub fn insert_subject(&self, name: &str) -> Subject {
        let row = Subject {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.write().subjects.push(row.clone());
        row
    }

    pub fn insert_class(&self, name: &str) -> SchoolClass {
        let row = SchoolClass {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.write().classes.push(row.clone());
        row
    }

    pub fn insert_topic(&self, name: &str, subject_id: Uuid) -> Topic {
        let row = Topic {
            id: Uuid::new_v4(),
            name: name.to_string(),
            subject_id: Some(subject_id),
        };
        self.write().topics.push(row.clone());
        row
    }

    pub fn insert_question(&self, question: NewQuestion) -> Question {
        let row = Question {
            id: Uuid::new_v4(),
            question_text: question.question_text,
            marks: question.marks,
            difficulty_level: question.difficulty_level,
            question_type: question.question_type,
            subject_id: question.subject_id,
            topic_id: question.topic_id,
            class_id: question.class_id,
            created_at: Some(Utc::now()),
        };
        self.write().questions.push(row.clone());
        row
    }

    pub fn insert_option(&self, question_id: Uuid, text: &str, is_correct: bool) -> QuestionOption {
        let row = QuestionOption {
            id: Uuid::new_v4(),
            question_id,
            option_text: text.to_string(),
            is_correct,
        };
        self.write().options.push(row.clone());
        row
    }

    pub fn insert_image(&self, question_id: Uuid, url: &str) -> QuestionImage {
        let row = QuestionImage {
            id: Uuid::new_v4(),
            question_id,
            image_url: url.to_string(),
        };
        self.write().images.push(row.clone());
        row
    }

    pub fn exam_paper_count(&self) -> usize {
        self.read().papers.len()
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn filter_questions(
        &self,
        criteria: &QuestionCriteria,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Question>, AppError> {
        let data = self.read();
        Ok(data
            .questions
            .iter()
            .filter(|q| criteria.matches(q))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn options_and_images(&self, question_ids: &[Uuid]) -> Result<QuestionExtras, AppError> {
        let data = self.read();
        let mut extras = QuestionExtras::default();
        for option in data.options.iter().filter(|o| question_ids.contains(&o.question_id)) {
            extras
                .options
                .entry(option.question_id)
                .or_default()
                .push(option.clone());
        }
        for image in data.images.iter().filter(|i| question_ids.contains(&i.question_id)) {
            extras
                .images
                .entry(image.question_id)
                .or_default()
                .push(image.clone());
        }
        Ok(extras)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        Ok(self.read().questions.iter().find(|q| q.id == id).cloned())
    }

    async fn find_questions(&self, ids: &[Uuid]) -> Result<Vec<Question>, AppError> {
        Ok(self
            .read()
            .questions
            .iter()
            .filter(|q| ids.contains(&q.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn find_exam_type(&self, id: Uuid) -> Result<Option<ExamType>, AppError> {
        Ok(self.read().exam_types.iter().find(|e| e.id == id).cloned())
    }

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>, AppError> {
        Ok(self.read().subjects.iter().find(|s| s.id == id).cloned())
    }

    async fn find_class(&self, id: Uuid) -> Result<Option<SchoolClass>, AppError> {
        Ok(self.read().classes.iter().find(|c| c.id == id).cloned())
    }

    async fn find_topic(&self, id: Uuid) -> Result<Option<Topic>, AppError> {
        Ok(self.read().topics.iter().find(|t| t.id == id).cloned())
    }

    async fn list_exam_types(
        &self,
        name: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamType>, AppError> {
        let fragment = name.map(str::to_lowercase);
        let mut types: Vec<ExamType> = self
            .read()
            .exam_types
            .iter()
            .filter(|e| {
                fragment
                    .as_deref()
                    .is_none_or(|f| e.name.to_lowercase().contains(f))
            })
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn create_exam_type(&self, name: &str) -> Result<ExamType, AppError> {
        Ok(self.insert_exam_type(name))
    }

    async fn update_exam_type(&self, id: Uuid, name: &str) -> Result<Option<ExamType>, AppError> {
        self.transaction(|data| {
            Ok(data.exam_types.iter_mut().find(|e| e.id == id).map(|row| {
                row.name = name.to_string();
                row.clone()
            }))
        })
    }

    async fn delete_exam_type(&self, id: Uuid) -> Result<bool, AppError> {
        self.transaction(|data| {
            let Some(index) = data.exam_types.iter().position(|e| e.id == id) else {
                return Ok(false);
            };
            if data.papers.iter().any(|p| p.exam_type_id == Some(id)) {
                return Err(AppError::Conflict(format!(
                    "Exam type with ID {} is still used by exam papers",
                    id
                )));
            }
            data.exam_types.remove(index);
            Ok(true)
        })
    }
}

#[async_trait]
impl ExamPaperStore for MemoryStore {
    async fn find_exam_paper(&self, id: Uuid) -> Result<Option<ExamPaper>, AppError> {
        Ok(self.read().papers.iter().find(|p| p.id == id).cloned())
    }

    async fn list_exam_papers(
        &self,
        filter: &ExamPaperFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExamPaper>, AppError> {
        Ok(self
            .read()
            .papers
            .iter()
            .rev()
            .filter(|p| filter.matches(p))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn create_exam_paper_with_sections(
        &self,
        paper: NewExamPaper,
        sections: Vec<GeneratedSection>,
    ) -> Result<ExamPaper, AppError> {
        self.transaction(|data| {
            let now = Utc::now();
            let row = ExamPaper {
                id: Uuid::new_v4(),
                title: paper.title,
                exam_type_id: Some(paper.exam_type_id),
                subject_id: Some(paper.subject_id),
                class_id: Some(paper.class_id),
                total_marks: paper.total_marks,
                duration_minutes: paper.duration_minutes,
                created_at: Some(now),
                updated_at: Some(now),
            };
            data.papers.push(row.clone());

            for generated in &sections {
                let section = data.insert_section(row.id, &generated.section)?;
                data.insert_associations(section.id, &generated.questions)?;
            }
            Ok(row)
        })
    }

    async fn update_exam_paper(
        &self,
        id: Uuid,
        changes: &UpdateExamPaperRequest,
    ) -> Result<Option<ExamPaper>, AppError> {
        self.transaction(|data| {
            let Some(row) = data.papers.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            if let Some(title) = &changes.title {
                row.title = title.clone();
            }
            if let Some(exam_type_id) = changes.exam_type_id {
                row.exam_type_id = Some(exam_type_id);
            }
            if let Some(subject_id) = changes.subject_id {
                row.subject_id = Some(subject_id);
            }
            if let Some(class_id) = changes.class_id {
                row.class_id = Some(class_id);
            }
            if let Some(total_marks) = changes.total_marks {
                row.total_marks = total_marks;
            }
            if let Some(duration_minutes) = changes.duration_minutes {
                row.duration_minutes = duration_minutes;
            }
            row.updated_at = Some(Utc::now());
            Ok(Some(row.clone()))
        })
    }

    async fn delete_exam_paper(&self, id: Uuid) -> Result<bool, AppError> {
        self.transaction(|data| {
            let Some(index) = data.papers.iter().position(|p| p.id == id) else {
                return Ok(false);
            };
            let section_ids: HashSet<Uuid> = data
                .sections
                .iter()
                .filter(|s| s.exam_paper_id == id)
                .map(|s| s.id)
                .collect();
            data.section_questions
                .retain(|r| !section_ids.contains(&r.section_id));
            data.sections.retain(|s| s.exam_paper_id != id);
            data.papers.remove(index);
            Ok(true)
        })
    }

    async fn create_section(
        &self,
        exam_paper_id: Uuid,
        section: NewSection,
    ) -> Result<ExamPaperSection, AppError> {
        self.transaction(|data| data.insert_section(exam_paper_id, &section))
    }

    async fn update_section(
        &self,
        section_id: Uuid,
        section: NewSection,
    ) -> Result<Option<ExamPaperSection>, AppError> {
        self.transaction(|data| {
            let Some(index) = data.sections.iter().position(|s| s.id == section_id) else {
                return Ok(None);
            };
            check_section_values(&section)?;
            let exam_paper_id = data.sections[index].exam_paper_id;
            if data.sections.iter().any(|s| {
                s.exam_paper_id == exam_paper_id
                    && s.id != section_id
                    && s.section_number == section.section_number
            }) {
                return Err(AppError::Conflict(format!(
                    "Section number {} already exists for this exam paper",
                    section.section_number
                )));
            }

            let row = &mut data.sections[index];
            row.section_number = section.section_number;
            row.title = section.title.clone();
            row.instructions = section.instructions.clone();
            row.marks_per_question = section.marks_per_question;
            row.questions_to_answer = section.questions_to_answer;
            row.total_questions = section.total_questions;
            row.section_marks = section.section_marks();
            Ok(Some(row.clone()))
        })
    }

    async fn sections_by_paper_id(&self, exam_paper_id: Uuid) -> Result<Vec<ExamPaperSection>, AppError> {
        let mut sections: Vec<ExamPaperSection> = self
            .read()
            .sections
            .iter()
            .filter(|s| s.exam_paper_id == exam_paper_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.section_number);
        Ok(sections)
    }

    async fn find_section(&self, section_id: Uuid) -> Result<Option<ExamPaperSection>, AppError> {
        Ok(self.read().sections.iter().find(|s| s.id == section_id).cloned())
    }

    async fn delete_section_cascade(&self, section_id: Uuid) -> Result<bool, AppError> {
        self.transaction(|data| {
            let Some(index) = data.sections.iter().position(|s| s.id == section_id) else {
                return Ok(false);
            };
            data.section_questions.retain(|r| r.section_id != section_id);
            data.sections.remove(index);
            Ok(true)
        })
    }

    async fn questions_in_section(&self, section_id: Uuid) -> Result<Vec<SectionQuestion>, AppError> {
        Ok(self.read().sorted_section_questions(section_id))
    }

    async fn find_section_question(&self, id: Uuid) -> Result<Option<SectionQuestion>, AppError> {
        Ok(self
            .read()
            .section_questions
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn add_question_associations(
        &self,
        section_id: Uuid,
        rows: Vec<NewSectionQuestion>,
    ) -> Result<Vec<SectionQuestion>, AppError> {
        self.transaction(|data| data.insert_associations(section_id, &rows))
    }

    async fn remove_question_from_section(
        &self,
        section_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<SectionQuestion>, AppError> {
        let mut data = self.write();
        let position = data
            .section_questions
            .iter()
            .position(|r| r.section_id == section_id && r.question_id == question_id);
        Ok(position.map(|index| data.section_questions.remove(index)))
    }

    async fn remove_section_question(&self, id: Uuid) -> Result<Option<SectionQuestion>, AppError> {
        let mut data = self.write();
        let position = data.section_questions.iter().position(|r| r.id == id);
        Ok(position.map(|index| data.section_questions.remove(index)))
    }

    async fn update_section_question(
        &self,
        id: Uuid,
        question_number: i32,
        is_optional: bool,
    ) -> Result<Option<SectionQuestion>, AppError> {
        self.transaction(|data| {
            let Some(row) = data.section_questions.iter_mut().find(|r| r.id == id) else {
                return Ok(None);
            };
            row.question_number = question_number;
            row.is_optional = is_optional;
            let updated = row.clone();
            data.check_section_unique(updated.section_id)?;
            Ok(Some(updated))
        })
    }

    async fn reassign_question_numbers(
        &self,
        section_id: Uuid,
        rows: Vec<(Uuid, i32)>,
    ) -> Result<(), AppError> {
        self.transaction(|data| {
            for (id, number) in &rows {
                let row = data
                    .section_questions
                    .iter_mut()
                    .find(|r| r.id == *id && r.section_id == section_id)
                    .ok_or_else(|| AppError::not_found("Section question", id))?;
                row.question_number = *number;
            }
            // Checked once at the end, like a deferred constraint.
            data.check_section_unique(section_id)
        })
    }
}
