// src/services/references.rs

//! Lookups that turn a missing reference into a `NotFound` naming the entity.

use uuid::Uuid;

use crate::{
    error::AppError,
    models::reference::{ExamType, SchoolClass, Subject, Topic},
    store::ReferenceStore,
};

pub async fn require_exam_type(references: &dyn ReferenceStore, id: Uuid) -> Result<ExamType, AppError> {
    references
        .find_exam_type(id)
        .await?
        .ok_or_else(|| AppError::not_found("Exam type", id))
}

pub async fn require_subject(references: &dyn ReferenceStore, id: Uuid) -> Result<Subject, AppError> {
    references
        .find_subject(id)
        .await?
        .ok_or_else(|| AppError::not_found("Subject", id))
}

pub async fn require_class(references: &dyn ReferenceStore, id: Uuid) -> Result<SchoolClass, AppError> {
    references
        .find_class(id)
        .await?
        .ok_or_else(|| AppError::not_found("Class", id))
}

pub async fn require_topic(references: &dyn ReferenceStore, id: Uuid) -> Result<Topic, AppError> {
    references
        .find_topic(id)
        .await?
        .ok_or_else(|| AppError::not_found("Topic", id))
}
