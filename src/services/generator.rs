// src/services/generator.rs

//! Exam paper generation: validates references, selects questions for every
//! section with running numbering, and persists the result atomically.

use std::sync::Arc;

use rand::{Rng, rngs::StdRng};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::GenerationLimits,
    error::AppError,
    models::{
        exam_paper::NewExamPaper,
        generation::{
            GenerateExamPaperRequest, GenerateSectionQuestionsRequest, GeneratedExamPaper,
            SectionConfig, SelectedQuestion,
        },
        section::{GeneratedSection, NewSection, NewSectionQuestion},
    },
    services::{
        references::{require_class, require_exam_type, require_subject, require_topic},
        selector::SectionSelector,
    },
    store::{ExamPaperStore, QuestionStore, ReferenceStore},
};

pub struct ExamPaperGenerator<R = StdRng> {
    selector: SectionSelector<R>,
    papers: Arc<dyn ExamPaperStore>,
    references: Arc<dyn ReferenceStore>,
}

impl ExamPaperGenerator<StdRng> {
    pub fn new(
        questions: Arc<dyn QuestionStore>,
        papers: Arc<dyn ExamPaperStore>,
        references: Arc<dyn ReferenceStore>,
        limits: GenerationLimits,
    ) -> Self {
        Self::with_selector(SectionSelector::new(questions, limits), papers, references)
    }
}

impl<R: Rng + Send> ExamPaperGenerator<R> {
    pub fn with_selector(
        selector: SectionSelector<R>,
        papers: Arc<dyn ExamPaperStore>,
        references: Arc<dyn ReferenceStore>,
    ) -> Self {
        Self {
            selector,
            papers,
            references,
        }
    }

    /// Generates and persists a complete exam paper.
    ///
    /// Any failure before the final write leaves the store untouched.
    pub async fn generate_exam_paper(
        &self,
        request: GenerateExamPaperRequest,
    ) -> Result<GeneratedExamPaper, AppError> {
        request.validate()?;

        self.validate_exam_type(request.exam_type_id).await?;
        self.validate_subject_and_class(request.subject_id, request.class_id)
            .await?;
        for section in &request.sections {
            self.validate_topics(&section.topic_ids).await?;
        }

        tracing::info!(
            title = %request.title,
            sections = request.sections.len(),
            "Generating exam paper"
        );

        // Sum of declared totals, not recomputed from the selection.
        let total_marks: i32 = request.sections.iter().map(|s| s.total_marks).sum();

        let mut questions: Vec<SelectedQuestion> = Vec::new();
        let mut sections: Vec<GeneratedSection> = Vec::with_capacity(request.sections.len());

        for (index, config) in request.sections.iter().enumerate() {
            let next_number = questions.len() as i32 + 1;
            let used: Vec<Uuid> = questions.iter().map(|q| q.question_id).collect();

            let selected = self
                .selector
                .select_for_section(
                    config,
                    request.subject_id,
                    request.class_id,
                    next_number,
                    &used,
                )
                .await?;

            sections.push(build_section(index as i32 + 1, config, &selected));
            questions.extend(selected);
        }

        let derived_marks: i32 = sections.iter().map(|s| s.section.section_marks()).sum();
        if derived_marks != total_marks {
            tracing::warn!(
                declared = total_marks,
                derived = derived_marks,
                "Declared section totals differ from marks per question × questions to answer"
            );
        }

        let paper = self
            .papers
            .create_exam_paper_with_sections(
                NewExamPaper {
                    title: request.title,
                    exam_type_id: request.exam_type_id,
                    subject_id: request.subject_id,
                    class_id: request.class_id,
                    total_marks,
                    duration_minutes: request.duration_minutes,
                },
                sections,
            )
            .await?;

        tracing::info!(
            exam_paper_id = %paper.id,
            questions = questions.len(),
            total_marks,
            "Exam paper generated"
        );

        Ok(GeneratedExamPaper { paper, questions })
    }

    /// Previews the selection for one section without persisting anything.
    /// Numbering starts at 1.
    pub async fn generate_questions_for_section(
        &self,
        request: GenerateSectionQuestionsRequest,
    ) -> Result<Vec<SelectedQuestion>, AppError> {
        request.validate()?;
        self.validate_subject_and_class(request.subject_id, request.class_id)
            .await?;
        self.validate_topics(&request.section.topic_ids).await?;

        self.selector
            .select_for_section(
                &request.section,
                request.subject_id,
                request.class_id,
                1,
                &[],
            )
            .await
    }

    async fn validate_exam_type(&self, exam_type_id: Uuid) -> Result<(), AppError> {
        require_exam_type(self.references.as_ref(), exam_type_id).await?;
        Ok(())
    }

    async fn validate_subject_and_class(&self, subject_id: Uuid, class_id: Uuid) -> Result<(), AppError> {
        require_subject(self.references.as_ref(), subject_id).await?;
        require_class(self.references.as_ref(), class_id).await?;
        Ok(())
    }

    async fn validate_topics(&self, topic_ids: &[Uuid]) -> Result<(), AppError> {
        for &topic_id in topic_ids {
            require_topic(self.references.as_ref(), topic_id).await?;
        }
        Ok(())
    }
}

/// Structured section for a generated selection.
///
/// `questions_to_answer` is `total_marks / marks_per_question`, kept within
/// `1..=total_questions`; positions past it are the optional extra choices.
/// `selected` is never empty, the selector rejects zero-sized allocations.
fn build_section(section_number: i32, config: &SectionConfig, selected: &[SelectedQuestion]) -> GeneratedSection {
    let total_questions = selected.len() as i32;
    let questions_to_answer = (config.total_marks / config.marks_per_question)
        .max(1)
        .min(total_questions);

    let questions = selected
        .iter()
        .enumerate()
        .map(|(position, q)| NewSectionQuestion {
            question_id: q.question_id,
            question_number: q.question_number,
            is_optional: position as i32 >= questions_to_answer,
        })
        .collect();

    GeneratedSection {
        section: NewSection {
            section_number,
            title: config.section.clone(),
            instructions: None,
            marks_per_question: config.marks_per_question,
            questions_to_answer,
            total_questions,
        },
        questions,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;

    use super::*;
    use crate::{
        models::{
            generation::DifficultyDistribution,
            question::{Difficulty, NewQuestion, QuestionType},
        },
        store::MemoryStore,
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        generator: ExamPaperGenerator<StdRng>,
        exam_type: Uuid,
        subject: Uuid,
        class: Uuid,
    }

    fn fixture(per_difficulty: usize, marks: &[i32]) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let exam_type = store.insert_exam_type("Final").id;
        let subject = store.insert_subject("Chemistry").id;
        let class = store.insert_class("Grade 11").id;
        for &m in marks {
            for difficulty in Difficulty::ALL {
                for i in 0..per_difficulty {
                    store.insert_question(NewQuestion {
                        question_text: format!("{}-mark {} #{}", m, difficulty, i),
                        marks: m,
                        difficulty_level: difficulty,
                        question_type: QuestionType::MultipleChoice,
                        subject_id: Some(subject),
                        topic_id: None,
                        class_id: Some(class),
                    });
                }
            }
        }
        let selector = SectionSelector::with_rng(
            store.clone(),
            GenerationLimits::default(),
            StdRng::seed_from_u64(99),
        );
        let generator = ExamPaperGenerator::with_selector(selector, store.clone(), store.clone());
        Fixture { store, generator, exam_type, subject, class }
    }

    fn section(label: &str, marks_per_question: i32, total_questions: i32) -> SectionConfig {
        SectionConfig {
            section: label.to_string(),
            total_marks: marks_per_question * total_questions,
            marks_per_question,
            total_questions,
            question_type: None,
            difficulty_distribution: None,
            topic_ids: vec![],
        }
    }

    fn request(f: &Fixture, sections: Vec<SectionConfig>) -> GenerateExamPaperRequest {
        GenerateExamPaperRequest {
            title: "Chemistry Final".to_string(),
            exam_type_id: f.exam_type,
            subject_id: f.subject,
            class_id: f.class,
            duration_minutes: 120,
            sections,
        }
    }

    #[tokio::test]
    async fn numbering_is_contiguous_across_sections() {
        let f = fixture(4, &[2]);
        let generated = f
            .generator
            .generate_exam_paper(request(&f, vec![section("A", 2, 5), section("B", 2, 7)]))
            .await
            .unwrap();

        let numbers: Vec<i32> = generated.questions.iter().map(|q| q.question_number).collect();
        assert_eq!(numbers, (1..=12).collect::<Vec<_>>());
        let ids: HashSet<Uuid> = generated.questions.iter().map(|q| q.question_id).collect();
        assert_eq!(ids.len(), 12);
        assert_eq!(generated.paper.total_marks, 24);

        let sections = f.store.sections_by_paper_id(generated.paper.id).await.unwrap();
        assert_eq!(sections.len(), 2);
        let marks: i32 = sections.iter().map(|s| s.section_marks).sum();
        assert_eq!(marks, generated.paper.total_marks);
        assert_eq!(sections[0].total_questions, 5);
        assert_eq!(sections[1].total_questions, 7);
    }

    #[tokio::test]
    async fn insufficient_pool_persists_nothing() {
        let f = fixture(1, &[2]);
        let result = f
            .generator
            .generate_exam_paper(request(&f, vec![section("A", 2, 2), section("B", 2, 5)]))
            .await;

        assert!(matches!(result, Err(AppError::InsufficientQuestions { .. })));
        assert_eq!(f.store.exam_paper_count(), 0);
    }

    #[tokio::test]
    async fn missing_entities_are_checked_in_order() {
        let f = fixture(1, &[1]);
        let mut req = request(&f, vec![section("A", 1, 1)]);
        req.exam_type_id = Uuid::new_v4();
        req.subject_id = Uuid::new_v4();

        let err = f.generator.generate_exam_paper(req).await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.starts_with("Exam type with ID")),
            other => panic!("unexpected error: {:?}", other),
        }

        let mut req = request(&f, vec![section("A", 1, 1)]);
        req.class_id = Uuid::new_v4();
        let err = f.generator.generate_exam_paper(req).await.unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.starts_with("Class with ID")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_topic_is_not_found() {
        let f = fixture(2, &[1]);
        let mut config = section("A", 1, 1);
        config.topic_ids = vec![Uuid::new_v4()];

        let err = f
            .generator
            .generate_exam_paper(request(&f, vec![config]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.starts_with("Topic with ID")));
    }

    #[tokio::test]
    async fn extra_choices_are_flagged_optional() {
        let f = fixture(3, &[1]);
        let mut config = section("Answer any 4", 1, 5);
        config.total_marks = 4;

        let generated = f
            .generator
            .generate_exam_paper(request(&f, vec![config]))
            .await
            .unwrap();

        let sections = f.store.sections_by_paper_id(generated.paper.id).await.unwrap();
        assert_eq!(sections[0].questions_to_answer, 4);
        assert_eq!(sections[0].section_marks, 4);

        let rows = f.store.questions_in_section(sections[0].id).await.unwrap();
        let optional: Vec<bool> = rows.iter().map(|r| r.is_optional).collect();
        assert_eq!(optional, vec![false, false, false, false, true]);
    }

    #[tokio::test]
    async fn preview_does_not_persist() {
        let f = fixture(4, &[3]);
        let mut config = section("Long answers", 3, 6);
        config.difficulty_distribution = Some(DifficultyDistribution {
            low: 50.0,
            medium: 0.0,
            hard: 50.0,
        });

        let preview = f
            .generator
            .generate_questions_for_section(GenerateSectionQuestionsRequest {
                subject_id: f.subject,
                class_id: f.class,
                section: config,
            })
            .await
            .unwrap();

        assert_eq!(preview.len(), 6);
        assert_eq!(preview[0].question_number, 1);
        assert!(preview
            .iter()
            .all(|q| q.question.question.difficulty_level != Difficulty::Medium));
        assert_eq!(f.store.exam_paper_count(), 0);
    }

    #[tokio::test]
    async fn section_rounding_to_zero_questions_saves_nothing() {
        let f = fixture(3, &[2]);
        let mut config = section("Short answers", 2, 1);
        config.difficulty_distribution = Some(DifficultyDistribution {
            low: 30.0,
            medium: 40.0,
            hard: 30.0,
        });

        let err = f
            .generator
            .generate_exam_paper(request(&f, vec![config]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Short answers")));
        assert_eq!(f.store.exam_paper_count(), 0);
    }

    #[tokio::test]
    async fn invalid_section_config_is_rejected_before_lookup() {
        let f = fixture(1, &[1]);
        let mut config = section("A", 1, 1);
        config.marks_per_question = 0;
        let mut req = request(&f, vec![config]);
        req.exam_type_id = Uuid::new_v4();

        let err = f.generator.generate_exam_paper(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
