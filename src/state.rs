// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{ExamPaperGenerator, ExamPaperService, ExamTypeService, SectionService},
    store::{ExamPaperStore, QuestionStore, ReferenceStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generator: Arc<ExamPaperGenerator>,
    pub sections: Arc<SectionService>,
    pub exam_papers: Arc<ExamPaperService>,
    pub exam_types: Arc<ExamTypeService>,
}

impl AppState {
    /// Wires every service to the given stores.
    pub fn new(
        config: Config,
        questions: Arc<dyn QuestionStore>,
        papers: Arc<dyn ExamPaperStore>,
        references: Arc<dyn ReferenceStore>,
    ) -> Self {
        let generator = ExamPaperGenerator::new(
            questions.clone(),
            papers.clone(),
            references.clone(),
            config.limits,
        );
        Self {
            generator: Arc::new(generator),
            sections: Arc::new(SectionService::new(papers.clone(), questions.clone())),
            exam_papers: Arc::new(ExamPaperService::new(papers, questions, references.clone())),
            exam_types: Arc::new(ExamTypeService::new(references)),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<ExamPaperGenerator> {
    fn from_ref(state: &AppState) -> Self {
        state.generator.clone()
    }
}

impl FromRef<AppState> for Arc<SectionService> {
    fn from_ref(state: &AppState) -> Self {
        state.sections.clone()
    }
}

impl FromRef<AppState> for Arc<ExamPaperService> {
    fn from_ref(state: &AppState) -> Self {
        state.exam_papers.clone()
    }
}

impl FromRef<AppState> for Arc<ExamTypeService> {
    fn from_ref(state: &AppState) -> Self {
        state.exam_types.clone()
    }
}
