// src/handlers/exam_type.rs

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
    models::reference::{CreateExamTypeRequest, ExamTypeQuery, UpdateExamTypeRequest},
    services::ExamTypeService,
};

/// Lists exam types by name, paged with `limit` and `offset`.
pub async fn list_exam_types(
    State(service): State<Arc<ExamTypeService>>,
    Query(query): Query<ExamTypeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let exam_types = service.list_exam_types(&query).await?;
    Ok(Json(exam_types))
}

pub async fn search_exam_types(
    State(service): State<Arc<ExamTypeService>>,
    Query(query): Query<ExamTypeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let exam_types = service.search_exam_types(&query).await?;
    Ok(Json(exam_types))
}

pub async fn get_exam_type(
    State(service): State<Arc<ExamTypeService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let exam_type = service.get_exam_type(id).await?;
    Ok(Json(exam_type))
}

pub async fn create_exam_type(
    State(service): State<Arc<ExamTypeService>>,
    Json(payload): Json<CreateExamTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam_type = service.create_exam_type(payload).await?;
    Ok((StatusCode::CREATED, Json(exam_type)))
}

pub async fn update_exam_type(
    State(service): State<Arc<ExamTypeService>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateExamTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam_type = service.update_exam_type(id, payload).await?;
    Ok(Json(exam_type))
}

/// Deletes an exam type. Fails with 409 while exam papers still use it.
pub async fn delete_exam_type(
    State(service): State<Arc<ExamTypeService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_exam_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
