// tests/exam_type_tests.rs

mod common;

use common::{generate_paper, seed_catalog, spawn_app};
use serde_json::{Value, json};

#[tokio::test]
async fn exam_type_lifecycle() {
    let app = spawn_app().await;

    for name in ["Midterm", "Final", "Unit Test"] {
        let response = app
            .client
            .post(app.url("/api/exam-types"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
    }

    let listed: Vec<Value> = app
        .client
        .get(app.url("/api/exam-types?limit=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["name"], "Final");
    let id = listed[1]["id"].as_str().unwrap().to_string();

    let found: Vec<Value> = app
        .client
        .get(app.url("/api/exam-types/search?name=term"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Midterm");

    let response = app
        .client
        .put(app.url(&format!("/api/exam-types/{}", id)))
        .json(&json!({ "name": "Mid-year" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let renamed: Value = response.json().await.unwrap();
    assert_eq!(renamed["name"], "Mid-year");

    let response = app
        .client
        .delete(app.url(&format!("/api/exam-types/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = app
        .client
        .get(app.url(&format!("/api/exam-types/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn invalid_name_is_400() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/exam-types"))
        .json(&json!({ "name": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn exam_type_used_by_a_paper_is_409_on_delete() {
    let app = spawn_app().await;
    let catalog = seed_catalog(&app.store, 10, 2);
    generate_paper(&app, &catalog).await;

    let response = app
        .client
        .delete(app.url(&format!("/api/exam-types/{}", catalog.exam_type)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}
