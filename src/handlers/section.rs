// src/handlers/section.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::section::{
        AddQuestionRequest, AddQuestionsRequest, CreateSectionRequest, ReorderQuestionsRequest,
        UpdateSectionQuestionRequest, UpdateSectionRequest,
    },
    services::SectionService,
};

// --- Sections ---

pub async fn list_sections(
    State(service): State<Arc<SectionService>>,
    Path(exam_paper_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sections = service.sections_by_exam_paper(exam_paper_id).await?;
    Ok(Json(sections))
}

/// Adds a section to an existing exam paper.
/// `section_marks` is computed, never accepted from the client.
pub async fn create_section(
    State(service): State<Arc<SectionService>>,
    Path(exam_paper_id): Path<Uuid>,
    Json(payload): Json<CreateSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let section = service.create_section(exam_paper_id, payload).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

pub async fn get_section(
    State(service): State<Arc<SectionService>>,
    Path(section_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let section = service.get_section_with_questions(section_id).await?;
    Ok(Json(section))
}

pub async fn update_section(
    State(service): State<Arc<SectionService>>,
    Path(section_id): Path<Uuid>,
    Json(payload): Json<UpdateSectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let section = service.update_section(section_id, payload).await?;
    Ok(Json(section))
}

pub async fn delete_section(
    State(service): State<Arc<SectionService>>,
    Path(section_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_section(section_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Section questions ---

pub async fn list_section_questions(
    State(service): State<Arc<SectionService>>,
    Path(section_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let questions = service.questions_in_section(section_id).await?;
    Ok(Json(questions))
}

pub async fn add_question(
    State(service): State<Arc<SectionService>>,
    Path(section_id): Path<Uuid>,
    Json(payload): Json<AddQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let association = service.add_question_to_section(section_id, payload).await?;
    Ok((StatusCode::CREATED, Json(association)))
}

/// Adds several questions at once. Either all are added or none.
pub async fn add_questions(
    State(service): State<Arc<SectionService>>,
    Path(section_id): Path<Uuid>,
    Json(payload): Json<AddQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let associations = service.add_questions_to_section(section_id, payload).await?;
    Ok((StatusCode::CREATED, Json(associations)))
}

pub async fn reorder_questions(
    State(service): State<Arc<SectionService>>,
    Path(section_id): Path<Uuid>,
    Json(payload): Json<ReorderQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let questions = service.reorder_questions_in_section(section_id, payload).await?;
    Ok(Json(questions))
}

pub async fn remove_question(
    State(service): State<Arc<SectionService>>,
    Path((section_id, question_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    service
        .remove_question_from_section(section_id, question_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_section_question(
    State(service): State<Arc<SectionService>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSectionQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let association = service.update_question_in_section(id, payload).await?;
    Ok(Json(association))
}

pub async fn delete_section_question(
    State(service): State<Arc<SectionService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    service.remove_section_question(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
