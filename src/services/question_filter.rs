// src/services/question_filter.rs

use uuid::Uuid;

use crate::{
    error::AppError,
    models::question::{QuestionCriteria, QuestionDetails},
    store::QuestionStore,
};

/// Fetches up to `limit` questions matching `criteria`, with their options and
/// images attached through a single batched lookup.
///
/// Never fails on a short pool: callers compare the length with what they need.
pub async fn filter_candidates(
    store: &dyn QuestionStore,
    criteria: &QuestionCriteria,
    limit: usize,
) -> Result<Vec<QuestionDetails>, AppError> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let questions = store.filter_questions(criteria, limit as i64, 0).await?;
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
    let mut extras = store.options_and_images(&ids).await?;

    Ok(questions.into_iter().map(|q| extras.attach(q)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::question::{Difficulty, NewQuestion, QuestionType},
        store::MemoryStore,
    };

    #[tokio::test]
    async fn attaches_options_and_respects_limit_and_topics() {
        let store = MemoryStore::new();
        let subject = store.insert_subject("Physics");
        let class = store.insert_class("Grade 10");
        let optics = store.insert_topic("Optics", subject.id);
        let mechanics = store.insert_topic("Mechanics", subject.id);

        for i in 0..5 {
            let topic = if i % 2 == 0 { optics.id } else { mechanics.id };
            let q = store.insert_question(NewQuestion {
                question_text: format!("Q{}", i),
                marks: 2,
                difficulty_level: Difficulty::Medium,
                question_type: QuestionType::MultipleChoice,
                subject_id: Some(subject.id),
                topic_id: Some(topic),
                class_id: Some(class.id),
            });
            store.insert_option(q.id, "A", true);
            store.insert_option(q.id, "B", false);
        }

        let criteria = QuestionCriteria {
            subject_id: subject.id,
            class_id: class.id,
            marks: 2,
            topic_ids: vec![optics.id],
            question_type: None,
            difficulty: None,
            exclude_ids: vec![],
        };

        let all_optics = filter_candidates(&store, &criteria, 10).await.unwrap();
        assert_eq!(all_optics.len(), 3);
        assert!(all_optics.iter().all(|q| q.question.topic_id == Some(optics.id)));
        assert!(all_optics.iter().all(|q| q.options.len() == 2));

        let bounded = filter_candidates(&store, &criteria, 2).await.unwrap();
        assert_eq!(bounded.len(), 2);

        let wrong_marks = QuestionCriteria { marks: 5, ..criteria };
        assert!(filter_candidates(&store, &wrong_marks, 10).await.unwrap().is_empty());
    }
}
