// src/handlers/exam_paper.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::exam_paper::{
        CreateExamPaperRequest, ExamPaperFilter, ExamPaperSearch, UpdateExamPaperRequest,
    },
    services::ExamPaperService,
};

/// Lists exam papers, newest first.
/// Supports filtering by exam type, subject, class, marks and duration ranges.
pub async fn list_exam_papers(
    State(service): State<Arc<ExamPaperService>>,
    Query(filter): Query<ExamPaperFilter>,
) -> Result<impl IntoResponse, AppError> {
    let papers = service.list_exam_papers(filter).await?;
    Ok(Json(papers))
}

/// Searches exam papers by a title fragment (case-insensitive).
pub async fn search_exam_papers(
    State(service): State<Arc<ExamPaperService>>,
    Query(search): Query<ExamPaperSearch>,
) -> Result<impl IntoResponse, AppError> {
    let papers = service.search_exam_papers(search).await?;
    Ok(Json(papers))
}

/// Creates an exam paper with no sections.
pub async fn create_exam_paper(
    State(service): State<Arc<ExamPaperService>>,
    Json(payload): Json<CreateExamPaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    let paper = service.create_exam_paper(payload).await?;
    Ok((StatusCode::CREATED, Json(paper)))
}

pub async fn update_exam_paper(
    State(service): State<Arc<ExamPaperService>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExamPaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    let paper = service.update_exam_paper(id, payload).await?;
    Ok(Json(paper))
}

pub async fn get_exam_paper(
    State(service): State<Arc<ExamPaperService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let paper = service.get_exam_paper(id).await?;
    Ok(Json(paper))
}

/// Deletes an exam paper together with its sections and question links.
pub async fn delete_exam_paper(
    State(service): State<Arc<ExamPaperService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_exam_paper(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
