// src/services/selector.rs

//! Random selection of questions for one section.

use std::sync::{Arc, Mutex};

use futures::future::try_join_all;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use uuid::Uuid;

use crate::{
    config::GenerationLimits,
    error::AppError,
    models::{
        generation::{SectionConfig, SelectedQuestion},
        question::{Difficulty, QuestionCriteria, QuestionDetails},
    },
    services::{
        allocator::{Allocation, DifficultyCounts, allocate},
        question_filter::filter_candidates,
    },
    store::QuestionStore,
};

/// Shuffles `pool` and keeps the first `required` entries.
pub fn sample<T, R: Rng + ?Sized>(rng: &mut R, mut pool: Vec<T>, required: usize) -> Vec<T> {
    pool.shuffle(rng);
    pool.truncate(required);
    pool
}

/// Numbers `picked` sequentially from `starting_number`, in the given order.
pub fn number_questions(
    label: &str,
    picked: Vec<QuestionDetails>,
    starting_number: i32,
) -> Vec<SelectedQuestion> {
    picked
        .into_iter()
        .zip(starting_number..)
        .map(|(question, question_number)| SelectedQuestion {
            question_id: question.question.id,
            question_number,
            section: label.to_string(),
            question,
        })
        .collect()
}

pub struct SectionSelector<R = StdRng> {
    questions: Arc<dyn QuestionStore>,
    rng: Mutex<R>,
    limits: GenerationLimits,
}

impl SectionSelector<StdRng> {
    pub fn new(questions: Arc<dyn QuestionStore>, limits: GenerationLimits) -> Self {
        Self::with_rng(questions, limits, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> SectionSelector<R> {
    pub fn with_rng(questions: Arc<dyn QuestionStore>, limits: GenerationLimits, rng: R) -> Self {
        Self {
            questions,
            rng: Mutex::new(rng),
            limits,
        }
    }

    /// Selects `config.total_questions` questions (or the per-difficulty counts)
    /// and numbers them from `starting_number`.
    ///
    /// `exclude_ids` keeps questions already used elsewhere in the same paper out
    /// of the candidate pool.
    pub async fn select_for_section(
        &self,
        config: &SectionConfig,
        subject_id: Uuid,
        class_id: Uuid,
        starting_number: i32,
        exclude_ids: &[Uuid],
    ) -> Result<Vec<SelectedQuestion>, AppError> {
        let total = usize::try_from(config.total_questions).map_err(|_| {
            AppError::Validation("Total questions must be greater than 0".to_string())
        })?;

        let criteria = QuestionCriteria {
            subject_id,
            class_id,
            marks: config.marks_per_question,
            topic_ids: config.topic_ids.clone(),
            question_type: config.question_type,
            difficulty: None,
            exclude_ids: exclude_ids.to_vec(),
        };

        let allocation = allocate(total, config.difficulty_distribution.as_ref());
        if allocation.total() == 0 {
            return Err(AppError::Validation(format!(
                "Difficulty distribution for section \"{}\" selects no questions out of {}",
                config.section, total
            )));
        }

        let picked = match allocation {
            Allocation::Flat(required) => self.select_flat(config, &criteria, required).await?,
            Allocation::ByDifficulty(counts) => {
                self.select_by_difficulty(config, &criteria, counts).await?
            }
        };

        tracing::debug!(
            section = %config.section,
            selected = picked.len(),
            starting_number,
            "Selected questions for section"
        );

        Ok(number_questions(&config.section, picked, starting_number))
    }

    async fn select_flat(
        &self,
        config: &SectionConfig,
        criteria: &QuestionCriteria,
        required: usize,
    ) -> Result<Vec<QuestionDetails>, AppError> {
        let limit = self
            .limits
            .candidate_limit(required, self.limits.flat_pool_cap);
        let candidates = filter_candidates(self.questions.as_ref(), criteria, limit).await?;

        if candidates.len() < required {
            return Err(AppError::InsufficientQuestions {
                section: config.section.clone(),
                difficulty: None,
                required,
                available: candidates.len(),
            });
        }

        let mut rng = self.lock_rng()?;
        Ok(sample(&mut *rng, candidates, required))
    }

    async fn select_by_difficulty(
        &self,
        config: &SectionConfig,
        criteria: &QuestionCriteria,
        counts: DifficultyCounts,
    ) -> Result<Vec<QuestionDetails>, AppError> {
        let buckets: Vec<(Difficulty, usize)> = counts.required().collect();

        // Independent reads; merged only after every bucket has been fetched.
        let fetched = try_join_all(buckets.iter().map(|&(difficulty, required)| {
            let bucket_criteria = criteria.with_difficulty(difficulty);
            let limit = self
                .limits
                .candidate_limit(required, self.limits.difficulty_pool_cap);
            async move {
                filter_candidates(self.questions.as_ref(), &bucket_criteria, limit).await
            }
        }))
        .await?;

        for (&(difficulty, required), pool) in buckets.iter().zip(&fetched) {
            if pool.len() < required {
                return Err(AppError::InsufficientQuestions {
                    section: config.section.clone(),
                    difficulty: Some(difficulty),
                    required,
                    available: pool.len(),
                });
            }
        }

        let mut rng = self.lock_rng()?;
        let mut combined = Vec::with_capacity(counts.total());
        for (&(_, required), pool) in buckets.iter().zip(fetched) {
            combined.extend(sample(&mut *rng, pool, required));
        }
        // Hide the difficulty grouping in the final order.
        combined.shuffle(&mut *rng);
        Ok(combined)
    }

    fn lock_rng(&self) -> Result<std::sync::MutexGuard<'_, R>, AppError> {
        self.rng
            .lock()
            .map_err(|_| AppError::Internal("random source lock poisoned".to_string()))
    }
}
