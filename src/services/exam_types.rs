// src/services/exam_types.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::DEFAULT_PAGE_LIMIT,
    error::AppError,
    models::reference::{CreateExamTypeRequest, ExamType, ExamTypeQuery, UpdateExamTypeRequest},
    services::references::require_exam_type,
    store::ReferenceStore,
};

pub struct ExamTypeService {
    references: Arc<dyn ReferenceStore>,
}

impl ExamTypeService {
    pub fn new(references: Arc<dyn ReferenceStore>) -> Self {
        Self { references }
    }

    pub async fn list_exam_types(&self, query: &ExamTypeQuery) -> Result<Vec<ExamType>, AppError> {
        let (limit, offset) = page(query);
        self.references.list_exam_types(None, limit, offset).await
    }

    /// Exam types whose name contains `query.name`, ignoring case.
    pub async fn search_exam_types(&self, query: &ExamTypeQuery) -> Result<Vec<ExamType>, AppError> {
        let (limit, offset) = page(query);
        let name = query.name.as_deref().unwrap_or_default();
        self.references.list_exam_types(Some(name), limit, offset).await
    }

    pub async fn get_exam_type(&self, id: Uuid) -> Result<ExamType, AppError> {
        require_exam_type(self.references.as_ref(), id).await
    }

    pub async fn create_exam_type(&self, request: CreateExamTypeRequest) -> Result<ExamType, AppError> {
        request.validate()?;
        let exam_type = self.references.create_exam_type(&request.name).await?;
        tracing::info!(exam_type_id = %exam_type.id, name = %exam_type.name, "Exam type created");
        Ok(exam_type)
    }

    pub async fn update_exam_type(
        &self,
        id: Uuid,
        request: UpdateExamTypeRequest,
    ) -> Result<ExamType, AppError> {
        request.validate()?;
        let Some(name) = request.name else {
            return self.get_exam_type(id).await;
        };
        self.references
            .update_exam_type(id, &name)
            .await?
            .ok_or_else(|| AppError::not_found("Exam type", id))
    }

    pub async fn delete_exam_type(&self, id: Uuid) -> Result<(), AppError> {
        if !self.references.delete_exam_type(id).await? {
            return Err(AppError::not_found("Exam type", id));
        }
        tracing::info!(exam_type_id = %id, "Exam type deleted");
        Ok(())
    }
}

fn page(query: &ExamTypeQuery) -> (i64, i64) {
    (
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, DEFAULT_PAGE_LIMIT),
        query.offset.unwrap_or(0).max(0),
    )
}
