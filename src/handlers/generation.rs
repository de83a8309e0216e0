// src/handlers/generation.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    error::AppError,
    models::generation::{GenerateExamPaperRequest, GenerateSectionQuestionsRequest},
    services::ExamPaperGenerator,
};

/// Generates and saves a complete exam paper from section configurations.
pub async fn generate_exam_paper(
    State(generator): State<Arc<ExamPaperGenerator>>,
    Json(payload): Json<GenerateExamPaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    let paper = generator.generate_exam_paper(payload).await?;
    Ok((StatusCode::CREATED, Json(paper)))
}

/// Previews the questions one section would receive. Nothing is saved.
pub async fn generate_section_questions(
    State(generator): State<Arc<ExamPaperGenerator>>,
    Json(payload): Json<GenerateSectionQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let questions = generator.generate_questions_for_section(payload).await?;
    Ok(Json(questions))
}
