// src/services/sections.rs

//! Post-creation editing of an exam paper's sections and their questions.
//!
//! Uniqueness is pre-checked here only to produce precise errors; the store's
//! constraints remain the authoritative guard against concurrent writers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::QuestionSummary,
        section::{
            AddQuestionRequest, AddQuestionsRequest, CreateSectionRequest, ExamPaperSection,
            NewSection, NewSectionQuestion, ReorderQuestionsRequest, SectionQuestion,
            SectionQuestionView, SectionWithQuestions, UpdateSectionQuestionRequest,
            UpdateSectionRequest,
        },
    },
    store::{ExamPaperStore, QuestionStore},
};

/// Joins junction rows with summaries of their questions, in one lookup.
pub async fn section_question_views(
    questions: &dyn QuestionStore,
    rows: Vec<SectionQuestion>,
) -> Result<Vec<SectionQuestionView>, AppError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.question_id).collect();
    let summaries: HashMap<Uuid, QuestionSummary> = questions
        .find_questions(&ids)
        .await?
        .iter()
        .map(|q| (q.id, QuestionSummary::from(q)))
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| SectionQuestionView {
            id: row.id,
            question_number: row.question_number,
            is_optional: row.is_optional,
            question: summaries.get(&row.question_id).cloned(),
        })
        .collect())
}

fn validate_section_values(section: &NewSection) -> Result<(), AppError> {
    if section.marks_per_question <= 0 {
        return Err(AppError::Validation(
            "Marks per question must be greater than 0".to_string(),
        ));
    }
    if section.questions_to_answer <= 0 {
        return Err(AppError::Validation(
            "Questions to answer must be greater than 0".to_string(),
        ));
    }
    if section.total_questions <= 0 {
        return Err(AppError::Validation(
            "Total questions must be greater than 0".to_string(),
        ));
    }
    if section.questions_to_answer > section.total_questions {
        return Err(AppError::Validation(
            "Questions to answer cannot be greater than total questions".to_string(),
        ));
    }
    if section.section_number <= 0 {
        return Err(AppError::Validation(
            "Section number must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Smallest numbers above the current maximum that are not yet taken.
struct NumberAllocator {
    used: HashSet<i32>,
    next: i32,
}

impl NumberAllocator {
    fn new(existing: &[SectionQuestion]) -> Self {
        let used: HashSet<i32> = existing.iter().map(|r| r.question_number).collect();
        let next = used.iter().copied().max().unwrap_or(0) + 1;
        Self { used, next }
    }

    fn assign(&mut self, requested: Option<i32>) -> Result<i32, AppError> {
        match requested {
            Some(number) => {
                if !self.used.insert(number) {
                    return Err(AppError::Conflict(format!(
                        "Question number {} already exists in this section",
                        number
                    )));
                }
                Ok(number)
            }
            None => {
                while self.used.contains(&self.next) {
                    self.next += 1;
                }
                let number = self.next;
                self.used.insert(number);
                self.next += 1;
                Ok(number)
            }
        }
    }
}

pub struct SectionService {
    papers: Arc<dyn ExamPaperStore>,
    questions: Arc<dyn QuestionStore>,
}

impl SectionService {
    pub fn new(papers: Arc<dyn ExamPaperStore>, questions: Arc<dyn QuestionStore>) -> Self {
        Self { papers, questions }
    }

    async fn require_paper(&self, exam_paper_id: Uuid) -> Result<(), AppError> {
        self.papers
            .find_exam_paper(exam_paper_id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam paper", exam_paper_id))?;
        Ok(())
    }

    pub async fn get_section(&self, section_id: Uuid) -> Result<ExamPaperSection, AppError> {
        self.papers
            .find_section(section_id)
            .await?
            .ok_or_else(|| AppError::not_found("Section", section_id))
    }

    pub async fn create_section(
        &self,
        exam_paper_id: Uuid,
        request: CreateSectionRequest,
    ) -> Result<ExamPaperSection, AppError> {
        self.require_paper(exam_paper_id).await?;

        let section = NewSection {
            section_number: request.section_number,
            title: request.title.clone(),
            instructions: request.instructions.clone(),
            marks_per_question: request.marks_per_question,
            questions_to_answer: request.questions_to_answer,
            total_questions: request.total_questions,
        };
        validate_section_values(&section)?;
        request.validate()?;

        let existing = self.papers.sections_by_paper_id(exam_paper_id).await?;
        if existing
            .iter()
            .any(|s| s.section_number == section.section_number)
        {
            return Err(AppError::Conflict(format!(
                "Section number {} already exists for this exam paper",
                section.section_number
            )));
        }

        let created = self.papers.create_section(exam_paper_id, section).await?;
        tracing::info!(section_id = %created.id, %exam_paper_id, "Section created");
        Ok(created)
    }

    pub async fn sections_by_exam_paper(
        &self,
        exam_paper_id: Uuid,
    ) -> Result<Vec<ExamPaperSection>, AppError> {
        self.require_paper(exam_paper_id).await?;
        self.papers.sections_by_paper_id(exam_paper_id).await
    }

    pub async fn get_section_with_questions(
        &self,
        section_id: Uuid,
    ) -> Result<SectionWithQuestions, AppError> {
        let section = self.get_section(section_id).await?;
        let rows = self.papers.questions_in_section(section_id).await?;
        let questions = section_question_views(self.questions.as_ref(), rows).await?;
        Ok(SectionWithQuestions { section, questions })
    }

    /// Partial update. Merged values are re-validated and `section_marks` is
    /// recomputed by the store from the merged inputs.
    pub async fn update_section(
        &self,
        section_id: Uuid,
        request: UpdateSectionRequest,
    ) -> Result<ExamPaperSection, AppError> {
        let current = self.get_section(section_id).await?;
        request.validate()?;

        let mut merged = NewSection::from(&current);
        if let Some(number) = request.section_number {
            merged.section_number = number;
        }
        if let Some(title) = request.title {
            merged.title = title;
        }
        if let Some(instructions) = request.instructions {
            merged.instructions = Some(instructions);
        }
        if let Some(marks) = request.marks_per_question {
            merged.marks_per_question = marks;
        }
        if let Some(count) = request.questions_to_answer {
            merged.questions_to_answer = count;
        }
        if let Some(count) = request.total_questions {
            merged.total_questions = count;
        }
        validate_section_values(&merged)?;

        let assigned = self.papers.questions_in_section(section_id).await?.len() as i32;
        if merged.total_questions < assigned {
            return Err(AppError::Validation(format!(
                "Total questions cannot be less than the {} questions already in this section",
                assigned
            )));
        }

        if merged.section_number != current.section_number {
            let siblings = self.papers.sections_by_paper_id(current.exam_paper_id).await?;
            if siblings
                .iter()
                .any(|s| s.id != section_id && s.section_number == merged.section_number)
            {
                return Err(AppError::Conflict(format!(
                    "Section number {} already exists for this exam paper",
                    merged.section_number
                )));
            }
        }

        self.papers
            .update_section(section_id, merged)
            .await?
            .ok_or_else(|| AppError::not_found("Section", section_id))
    }

    /// Deletes the section and all of its question associations atomically.
    pub async fn delete_section(&self, section_id: Uuid) -> Result<(), AppError> {
        self.get_section(section_id).await?;
        if !self.papers.delete_section_cascade(section_id).await? {
            return Err(AppError::not_found("Section", section_id));
        }
        tracing::info!(%section_id, "Section deleted");
        Ok(())
    }

    pub async fn add_question_to_section(
        &self,
        section_id: Uuid,
        request: AddQuestionRequest,
    ) -> Result<SectionQuestion, AppError> {
        request.validate()?;
        let section = self.get_section(section_id).await?;

        self.questions
            .find_question(request.question_id)
            .await?
            .ok_or_else(|| AppError::not_found("Question", request.question_id))?;

        let current = self.papers.questions_in_section(section_id).await?;
        if current.iter().any(|r| r.question_id == request.question_id) {
            return Err(AppError::Conflict(
                "Question already exists in this section".to_string(),
            ));
        }
        if current.len() as i32 >= section.total_questions {
            return Err(AppError::Validation(format!(
                "Cannot add more questions. Section allows maximum {} questions",
                section.total_questions
            )));
        }

        let question_number = NumberAllocator::new(&current).assign(request.question_number)?;

        let mut inserted = self
            .papers
            .add_question_associations(
                section_id,
                vec![NewSectionQuestion {
                    question_id: request.question_id,
                    question_number,
                    is_optional: request.is_optional.unwrap_or(false),
                }],
            )
            .await?;

        inserted
            .pop()
            .ok_or_else(|| AppError::Internal("Question association was not written".to_string()))
    }

    pub async fn add_questions_to_section(
        &self,
        section_id: Uuid,
        request: AddQuestionsRequest,
    ) -> Result<Vec<SectionQuestion>, AppError> {
        request.validate()?;
        let section = self.get_section(section_id).await?;
        let current = self.papers.questions_in_section(section_id).await?;

        if current.len() + request.questions.len() > section.total_questions as usize {
            return Err(AppError::Validation(format!(
                "Cannot add {} questions. Section allows maximum {} questions, and {} already exist",
                request.questions.len(),
                section.total_questions,
                current.len()
            )));
        }

        let mut seen: HashSet<Uuid> = current.iter().map(|r| r.question_id).collect();
        let duplicates: Vec<String> = request
            .questions
            .iter()
            .filter(|q| !seen.insert(q.question_id))
            .map(|q| q.question_id.to_string())
            .collect();
        if !duplicates.is_empty() {
            return Err(AppError::Conflict(format!(
                "Some questions already exist in this section: {}",
                duplicates.join(", ")
            )));
        }

        let requested_ids: Vec<Uuid> = request.questions.iter().map(|q| q.question_id).collect();
        let found: HashSet<Uuid> = self
            .questions
            .find_questions(&requested_ids)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();
        if let Some(missing) = requested_ids.iter().find(|id| !found.contains(*id)) {
            return Err(AppError::not_found("Question", missing));
        }

        let mut numbers = NumberAllocator::new(&current);
        let rows = request
            .questions
            .iter()
            .map(|q| {
                numbers
                    .assign(q.question_number)
                    .map(|question_number| NewSectionQuestion {
                        question_id: q.question_id,
                        question_number,
                        is_optional: q.is_optional.unwrap_or(false),
                    })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let inserted = self.papers.add_question_associations(section_id, rows).await?;
        tracing::info!(%section_id, added = inserted.len(), "Questions added to section");
        Ok(inserted)
    }

    pub async fn questions_in_section(
        &self,
        section_id: Uuid,
    ) -> Result<Vec<SectionQuestionView>, AppError> {
        self.get_section(section_id).await?;
        let rows = self.papers.questions_in_section(section_id).await?;
        section_question_views(self.questions.as_ref(), rows).await
    }

    pub async fn remove_question_from_section(
        &self,
        section_id: Uuid,
        question_id: Uuid,
    ) -> Result<SectionQuestion, AppError> {
        self.get_section(section_id).await?;
        self.papers
            .remove_question_from_section(section_id, question_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found in this section".to_string()))
    }

    pub async fn remove_section_question(&self, id: Uuid) -> Result<SectionQuestion, AppError> {
        self.papers
            .remove_section_question(id)
            .await?
            .ok_or_else(|| AppError::not_found("Section question", id))
    }

    pub async fn update_question_in_section(
        &self,
        id: Uuid,
        request: UpdateSectionQuestionRequest,
    ) -> Result<SectionQuestion, AppError> {
        request.validate()?;
        if request.question_number.is_none() && request.is_optional.is_none() {
            return Err(AppError::Validation(
                "Provide a question number or an optional flag to update".to_string(),
            ));
        }

        let current = self
            .papers
            .find_section_question(id)
            .await?
            .ok_or_else(|| AppError::not_found("Section question", id))?;

        let question_number = request.question_number.unwrap_or(current.question_number);
        if question_number != current.question_number {
            let siblings = self.papers.questions_in_section(current.section_id).await?;
            if siblings
                .iter()
                .any(|r| r.id != id && r.question_number == question_number)
            {
                return Err(AppError::Conflict(format!(
                    "Question number {} already exists in this section",
                    question_number
                )));
            }
        }

        self.papers
            .update_section_question(
                id,
                question_number,
                request.is_optional.unwrap_or(current.is_optional),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Section question", id))
    }

    /// Reassigns question numbers in one transaction.
    pub async fn reorder_questions_in_section(
        &self,
        section_id: Uuid,
        request: ReorderQuestionsRequest,
    ) -> Result<Vec<SectionQuestionView>, AppError> {
        request.validate()?;
        self.get_section(section_id).await?;
        let current = self.papers.questions_in_section(section_id).await?;

        let mut final_numbers: HashMap<Uuid, i32> =
            current.iter().map(|r| (r.id, r.question_number)).collect();
        for order in &request.orders {
            if order.new_question_number <= 0 {
                return Err(AppError::Validation(
                    "Question numbers must be greater than 0".to_string(),
                ));
            }
            match final_numbers.get_mut(&order.association_id) {
                Some(number) => *number = order.new_question_number,
                None => {
                    return Err(AppError::NotFound(format!(
                        "Section question with ID {} not found in this section",
                        order.association_id
                    )));
                }
            }
        }

        let mut taken = HashSet::new();
        for number in final_numbers.values() {
            if !taken.insert(*number) {
                return Err(AppError::Conflict(format!(
                    "Question number {} would be used more than once in this section",
                    number
                )));
            }
        }

        let rows = request
            .orders
            .iter()
            .map(|o| (o.association_id, o.new_question_number))
            .collect();
        self.papers.reassign_question_numbers(section_id, rows).await?;

        self.questions_in_section(section_id).await
    }
}
