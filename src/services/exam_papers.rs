// src/services/exam_papers.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::DEFAULT_PAGE_LIMIT,
    error::AppError,
    models::{
        exam_paper::{
            CreateExamPaperRequest, ExamPaper, ExamPaperDetail, ExamPaperFilter, ExamPaperSearch,
            UpdateExamPaperRequest,
        },
        section::SectionWithQuestions,
    },
    services::{
        references::{require_class, require_exam_type, require_subject},
        sections::section_question_views,
    },
    store::{ExamPaperStore, QuestionStore, ReferenceStore},
};

pub struct ExamPaperService {
    papers: Arc<dyn ExamPaperStore>,
    questions: Arc<dyn QuestionStore>,
    references: Arc<dyn ReferenceStore>,
}

impl ExamPaperService {
    pub fn new(
        papers: Arc<dyn ExamPaperStore>,
        questions: Arc<dyn QuestionStore>,
        references: Arc<dyn ReferenceStore>,
    ) -> Self {
        Self {
            papers,
            questions,
            references,
        }
    }

    /// Creates a paper without sections after checking every reference.
    pub async fn create_exam_paper(&self, request: CreateExamPaperRequest) -> Result<ExamPaper, AppError> {
        request.validate()?;
        require_exam_type(self.references.as_ref(), request.exam_type_id).await?;
        require_subject(self.references.as_ref(), request.subject_id).await?;
        require_class(self.references.as_ref(), request.class_id).await?;

        let paper = self
            .papers
            .create_exam_paper_with_sections(request.into(), Vec::new())
            .await?;
        tracing::info!(exam_paper_id = %paper.id, title = %paper.title, "Exam paper created");
        Ok(paper)
    }

    /// Updates the given fields. References are checked only when supplied.
    pub async fn update_exam_paper(
        &self,
        id: Uuid,
        request: UpdateExamPaperRequest,
    ) -> Result<ExamPaper, AppError> {
        request.validate()?;
        if self.papers.find_exam_paper(id).await?.is_none() {
            return Err(AppError::not_found("Exam paper", id));
        }

        if let Some(exam_type_id) = request.exam_type_id {
            require_exam_type(self.references.as_ref(), exam_type_id).await?;
        }
        if let Some(subject_id) = request.subject_id {
            require_subject(self.references.as_ref(), subject_id).await?;
        }
        if let Some(class_id) = request.class_id {
            require_class(self.references.as_ref(), class_id).await?;
        }

        self.papers
            .update_exam_paper(id, &request)
            .await?
            .ok_or_else(|| AppError::not_found("Exam paper", id))
    }

    /// Papers whose title contains `search.title`, ignoring case, newest first.
    pub async fn search_exam_papers(&self, search: ExamPaperSearch) -> Result<Vec<ExamPaper>, AppError> {
        self.list_exam_papers(ExamPaperFilter {
            title: Some(search.title),
            limit: search.limit,
            offset: search.offset,
            ..Default::default()
        })
        .await
    }

    /// The paper with every section and its numbered questions.
    pub async fn get_exam_paper(&self, id: Uuid) -> Result<ExamPaperDetail, AppError> {
        let paper = self
            .papers
            .find_exam_paper(id)
            .await?
            .ok_or_else(|| AppError::not_found("Exam paper", id))?;

        let mut sections = Vec::new();
        for section in self.papers.sections_by_paper_id(id).await? {
            let rows = self.papers.questions_in_section(section.id).await?;
            let questions = section_question_views(self.questions.as_ref(), rows).await?;
            sections.push(SectionWithQuestions { section, questions });
        }

        Ok(ExamPaperDetail { paper, sections })
    }

    pub async fn list_exam_papers(&self, filter: ExamPaperFilter) -> Result<Vec<ExamPaper>, AppError> {
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, DEFAULT_PAGE_LIMIT);
        let offset = filter.offset.unwrap_or(0).max(0);
        self.papers.list_exam_papers(&filter, limit, offset).await
    }

    pub async fn delete_exam_paper(&self, id: Uuid) -> Result<(), AppError> {
        if !self.papers.delete_exam_paper(id).await? {
            return Err(AppError::not_found("Exam paper", id));
        }
        tracing::info!(exam_paper_id = %id, "Exam paper deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            exam_paper::NewExamPaper,
            question::{Difficulty, NewQuestion, QuestionType},
            section::{GeneratedSection, NewSection, NewSectionQuestion},
        },
        store::MemoryStore,
    };

    async fn seeded() -> (Arc<MemoryStore>, ExamPaperService, ExamPaper) {
        let store = Arc::new(MemoryStore::new());
        let subject = store.insert_subject("Chemistry").id;
        let class = store.insert_class("Grade 11").id;
        let question = store.insert_question(NewQuestion {
            question_text: "Balance the equation".to_string(),
            marks: 4,
            difficulty_level: Difficulty::Hard,
            question_type: QuestionType::Descriptive,
            subject_id: Some(subject),
            topic_id: None,
            class_id: Some(class),
        });
        let paper = store
            .create_exam_paper_with_sections(
                NewExamPaper {
                    title: "Chemistry Final".to_string(),
                    exam_type_id: store.insert_exam_type("Final").id,
                    subject_id: subject,
                    class_id: class,
                    total_marks: 4,
                    duration_minutes: 90,
                },
                vec![GeneratedSection {
                    section: NewSection {
                        section_number: 1,
                        title: "Section A".to_string(),
                        instructions: None,
                        marks_per_question: 4,
                        questions_to_answer: 1,
                        total_questions: 1,
                    },
                    questions: vec![NewSectionQuestion {
                        question_id: question.id,
                        question_number: 1,
                        is_optional: false,
                    }],
                }],
            )
            .await
            .unwrap();
        let service = ExamPaperService::new(store.clone(), store.clone(), store.clone());
        (store, service, paper)
    }

    #[tokio::test]
    async fn detail_includes_sections_and_question_summaries() {
        let (_, service, paper) = seeded().await;
        let detail = service.get_exam_paper(paper.id).await.unwrap();

        assert_eq!(detail.paper.title, "Chemistry Final");
        assert_eq!(detail.sections.len(), 1);
        assert_eq!(detail.sections[0].section.section_marks, 4);
        let summary = detail.sections[0].questions[0].question.as_ref().unwrap();
        assert_eq!(summary.text, "Balance the equation");
    }

    #[tokio::test]
    async fn list_applies_filters() {
        let (_, service, paper) = seeded().await;
        let all = service.list_exam_papers(ExamPaperFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);

        let none = service
            .list_exam_papers(ExamPaperFilter {
                subject_id: Some(Uuid::new_v4()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        let by_duration = service
            .list_exam_papers(ExamPaperFilter {
                min_duration_minutes: Some(60),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_duration[0].id, paper.id);
    }

    #[tokio::test]
    async fn delete_removes_everything_and_reports_missing() {
        let (store, service, paper) = seeded().await;
        let section_id = store.sections_by_paper_id(paper.id).await.unwrap()[0].id;

        service.delete_exam_paper(paper.id).await.unwrap();
        assert_eq!(store.exam_paper_count(), 0);
        assert!(store.find_section(section_id).await.unwrap().is_none());
        assert!(store.questions_in_section(section_id).await.unwrap().is_empty());

        let err = service.delete_exam_paper(paper.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_checks_references_then_saves_an_empty_paper() {
        let (store, service, paper) = seeded().await;
        let request = CreateExamPaperRequest {
            title: "Chemistry Mock".to_string(),
            exam_type_id: paper.exam_type_id.unwrap(),
            subject_id: paper.subject_id.unwrap(),
            class_id: paper.class_id.unwrap(),
            total_marks: 40,
            duration_minutes: 60,
        };

        let mut missing_class = request.clone();
        missing_class.class_id = Uuid::new_v4();
        let err = service.create_exam_paper(missing_class).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.starts_with("Class with ID")));

        let mut missing_type = request.clone();
        missing_type.exam_type_id = Uuid::new_v4();
        let err = service.create_exam_paper(missing_type).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.starts_with("Exam type with ID")));
        assert_eq!(store.exam_paper_count(), 1);

        let created = service.create_exam_paper(request).await.unwrap();
        assert_eq!(created.title, "Chemistry Mock");
        assert_eq!(store.exam_paper_count(), 2);
        assert!(store.sections_by_paper_id(created.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let (store, service, paper) = seeded().await;
        let midterm = store.insert_exam_type("Midterm").id;

        let updated = service
            .update_exam_paper(
                paper.id,
                UpdateExamPaperRequest {
                    duration_minutes: Some(45),
                    exam_type_id: Some(midterm),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.duration_minutes, 45);
        assert_eq!(updated.exam_type_id, Some(midterm));
        assert_eq!(updated.title, "Chemistry Final");
        assert_eq!(updated.subject_id, paper.subject_id);

        let err = service
            .update_exam_paper(
                paper.id,
                UpdateExamPaperRequest {
                    subject_id: Some(Uuid::new_v4()),
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.starts_with("Subject with ID")));
        let stored = store.find_exam_paper(paper.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Chemistry Final");

        let err = service
            .update_exam_paper(Uuid::new_v4(), UpdateExamPaperRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.starts_with("Exam paper with ID")));
    }

    #[tokio::test]
    async fn search_matches_title_fragment_ignoring_case() {
        let (_, service, paper) = seeded().await;

        let found = service
            .search_exam_papers(ExamPaperSearch {
                title: "final".to_string(),
                limit: None,
                offset: None,
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, paper.id);

        let none = service
            .search_exam_papers(ExamPaperSearch {
                title: "biology".to_string(),
                limit: None,
                offset: None,
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
