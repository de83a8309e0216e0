// tests/section_tests.rs

mod common;

use common::{TestApp, generate_paper, seed_catalog, seed_questions, spawn_app};
use serde_json::{Value, json};

async fn create_section(app: &TestApp, paper_id: &str, body: Value) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/api/exam-papers/{}/sections", paper_id)))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request")
}

fn part_b(section_number: i32, questions_to_answer: i32, total_questions: i32) -> Value {
    json!({
        "section_number": section_number,
        "title": "Part B",
        "instructions": "Answer any two",
        "marks_per_question": 2,
        "questions_to_answer": questions_to_answer,
        "total_questions": total_questions,
    })
}

#[tokio::test]
async fn section_lifecycle() {
    let app = spawn_app().await;
    let catalog = seed_catalog(&app.store, 4, 2);
    let paper_id = generate_paper(&app, &catalog).await;

    // Create
    let response = create_section(&app, &paper_id, part_b(2, 2, 3)).await;
    assert_eq!(response.status().as_u16(), 201);
    let section: Value = response.json().await.unwrap();
    assert_eq!(section["section_marks"], 4);
    let section_id = section["id"].as_str().unwrap().to_string();

    // Duplicate number and impossible counts
    let response = create_section(&app, &paper_id, part_b(1, 2, 3)).await;
    assert_eq!(response.status().as_u16(), 409);
    let response = create_section(&app, &paper_id, part_b(3, 6, 5)).await;
    assert_eq!(response.status().as_u16(), 400);

    // List, ordered by number
    let sections: Value = app
        .client
        .get(app.url(&format!("/api/exam-papers/{}/sections", paper_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let numbers: Vec<i64> = sections
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["section_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);

    // Update recomputes marks
    let response = app
        .client
        .put(app.url(&format!("/api/sections/{}", section_id)))
        .json(&json!({ "questions_to_answer": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["section_marks"], 6);

    // Delete
    let response = app
        .client
        .delete(app.url(&format!("/api/sections/{}", section_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url(&format!("/api/sections/{}", section_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn adding_questions_enforces_uniqueness_and_capacity() {
    let app = spawn_app().await;
    let catalog = seed_catalog(&app.store, 4, 2);
    let extra = seed_questions(&app.store, &catalog, 4);
    let paper_id = generate_paper(&app, &catalog).await;

    let section: Value = create_section(&app, &paper_id, part_b(2, 2, 3))
        .await
        .json()
        .await
        .unwrap();
    let questions_url = app.url(&format!(
        "/api/sections/{}/questions",
        section["id"].as_str().unwrap()
    ));

    let response = app
        .client
        .post(&questions_url)
        .json(&json!({ "question_id": extra[0] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let first: Value = response.json().await.unwrap();
    assert_eq!(first["question_number"], 1);
    assert_eq!(first["is_optional"], false);

    let response = app
        .client
        .post(&questions_url)
        .json(&json!({ "question_id": extra[0] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .client
        .post(format!("{}/batch", questions_url))
        .json(&json!({
            "questions": [
                { "question_id": extra[1] },
                { "question_id": extra[2], "question_number": 5, "is_optional": true },
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let batch: Value = response.json().await.unwrap();
    let numbers: Vec<i64> = batch
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["question_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![2, 5]);

    // Section holds at most three questions.
    let response = app
        .client
        .post(&questions_url)
        .json(&json!({ "question_id": extra[3] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let listed: Value = app
        .client
        .get(&questions_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0]["question"]["text"], "Extra question 0");
    assert_eq!(listed[2]["question_number"], 5);
    assert_eq!(listed[2]["is_optional"], true);

    let response = app
        .client
        .post(app.url(&format!(
            "/api/sections/{}/questions",
            uuid::Uuid::new_v4()
        )))
        .json(&json!({ "question_id": extra[3] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn reorder_update_and_remove_questions() {
    let app = spawn_app().await;
    let catalog = seed_catalog(&app.store, 4, 2);
    let extra = seed_questions(&app.store, &catalog, 3);
    let paper_id = generate_paper(&app, &catalog).await;

    let section: Value = create_section(&app, &paper_id, part_b(2, 2, 3))
        .await
        .json()
        .await
        .unwrap();
    let section_id = section["id"].as_str().unwrap().to_string();
    let questions_url = app.url(&format!("/api/sections/{}/questions", section_id));

    let added: Value = app
        .client
        .post(format!("{}/batch", questions_url))
        .json(&json!({
            "questions": extra.iter().map(|id| json!({ "question_id": id })).collect::<Vec<_>>()
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<String> = added
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect();

    // Swap the first two numbers.
    let response = app
        .client
        .put(format!("{}/reorder", questions_url))
        .json(&json!({
            "orders": [
                { "association_id": ids[0], "new_question_number": 2 },
                { "association_id": ids[1], "new_question_number": 1 },
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let reordered: Value = response.json().await.unwrap();
    assert_eq!(reordered[0]["id"].as_str().unwrap(), ids[1]);
    assert_eq!(reordered[1]["id"].as_str().unwrap(), ids[0]);

    // Moving onto a taken number is a conflict.
    let response = app
        .client
        .put(app.url(&format!("/api/section-questions/{}", ids[2])))
        .json(&json!({ "question_number": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .client
        .put(app.url(&format!("/api/section-questions/{}", ids[2])))
        .json(&json!({ "is_optional": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["is_optional"], true);

    // Remove by question id, then by association id.
    let remove_url = format!("{}/{}", questions_url, extra[0]);
    let response = app.client.delete(&remove_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);
    let response = app.client.delete(&remove_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .client
        .delete(app.url(&format!("/api/section-questions/{}", ids[2])))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let remaining: Value = app
        .client
        .get(&questions_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"].as_str().unwrap(), ids[1]);
}
