// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use exam_forge::{
    config::{Config, GenerationLimits},
    models::question::{Difficulty, NewQuestion, QuestionType},
    routes,
    state::AppState,
    store::MemoryStore,
};
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

/// Spawns the app on a random port, backed by an in-memory store.
pub async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());

    let config = Config {
        database_url: "postgres://unused".to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        db_max_connections: 1,
        limits: GenerationLimits::default(),
    };

    let state = AppState::new(config, store.clone(), store.clone(), store.clone());
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

pub struct Catalog {
    pub exam_type: Uuid,
    pub subject: Uuid,
    pub class: Uuid,
    pub topic: Uuid,
}

/// Seeds `per_difficulty` questions of each difficulty worth `marks`, each
/// with two options.
pub fn seed_catalog(store: &MemoryStore, per_difficulty: usize, marks: i32) -> Catalog {
    let exam_type = store.insert_exam_type("Final").id;
    let subject = store.insert_subject("Geography").id;
    let class = store.insert_class("Grade 8").id;
    let topic = store.insert_topic("Rivers", subject).id;

    for difficulty in [Difficulty::Low, Difficulty::Medium, Difficulty::Hard] {
        for i in 0..per_difficulty {
            let question = store.insert_question(NewQuestion {
                question_text: format!("{} geography question {}", difficulty, i),
                marks,
                difficulty_level: difficulty,
                question_type: QuestionType::MultipleChoice,
                subject_id: Some(subject),
                topic_id: Some(topic),
                class_id: Some(class),
            });
            store.insert_option(question.id, "Yes", true);
            store.insert_option(question.id, "No", false);
        }
    }

    Catalog {
        exam_type,
        subject,
        class,
        topic,
    }
}

/// Adds `count` medium questions to an existing catalog and returns their ids.
pub fn seed_questions(store: &MemoryStore, catalog: &Catalog, count: usize) -> Vec<Uuid> {
    (0..count)
        .map(|i| {
            store
                .insert_question(NewQuestion {
                    question_text: format!("Extra question {}", i),
                    marks: 2,
                    difficulty_level: Difficulty::Medium,
                    question_type: QuestionType::Descriptive,
                    subject_id: Some(catalog.subject),
                    topic_id: None,
                    class_id: Some(catalog.class),
                })
                .id
        })
        .collect()
}

/// Generates a one-section paper through the API and returns its id.
pub async fn generate_paper(app: &TestApp, catalog: &Catalog) -> String {
    let response = app
        .client
        .post(app.url("/api/exam-papers/generate"))
        .json(&serde_json::json!({
            "title": "Section editing",
            "exam_type_id": catalog.exam_type,
            "subject_id": catalog.subject,
            "class_id": catalog.class,
            "duration_minutes": 60,
            "sections": [{
                "section": "Section A",
                "total_marks": 4,
                "marks_per_question": 2,
                "total_questions": 2,
            }]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}
