// src/routes.rs

use axum::{
    Router,
    http::{Method, header},
    routing::{delete, get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{exam_paper, exam_type, generation, section},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Nests the exam paper, exam type, section and section-question sub-routers.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let exam_paper_routes = Router::new()
        .route(
            "/",
            get(exam_paper::list_exam_papers).post(exam_paper::create_exam_paper),
        )
        .route("/search", get(exam_paper::search_exam_papers))
        .route("/generate", post(generation::generate_exam_paper))
        .route("/generate/section", post(generation::generate_section_questions))
        .route(
            "/{id}",
            get(exam_paper::get_exam_paper)
                .put(exam_paper::update_exam_paper)
                .delete(exam_paper::delete_exam_paper),
        )
        .route(
            "/{id}/sections",
            get(section::list_sections).post(section::create_section),
        );

    let exam_type_routes = Router::new()
        .route(
            "/",
            get(exam_type::list_exam_types).post(exam_type::create_exam_type),
        )
        .route("/search", get(exam_type::search_exam_types))
        .route(
            "/{id}",
            get(exam_type::get_exam_type)
                .put(exam_type::update_exam_type)
                .delete(exam_type::delete_exam_type),
        );

    let section_routes = Router::new()
        .route(
            "/{id}",
            get(section::get_section)
                .put(section::update_section)
                .delete(section::delete_section),
        )
        .route(
            "/{id}/questions",
            get(section::list_section_questions).post(section::add_question),
        )
        .route("/{id}/questions/batch", post(section::add_questions))
        .route("/{id}/questions/reorder", put(section::reorder_questions))
        .route(
            "/{id}/questions/{question_id}",
            delete(section::remove_question),
        );

    let section_question_routes = Router::new().route(
        "/{id}",
        put(section::update_section_question).delete(section::delete_section_question),
    );

    Router::new()
        .nest("/api/exam-papers", exam_paper_routes)
        .nest("/api/exam-types", exam_type_routes)
        .nest("/api/sections", section_routes)
        .nest("/api/section-questions", section_question_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
