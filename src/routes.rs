// src/routes.rs

use axum::{
    Json, Router,
    http::Method,
    routing::{get, post},
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{leaderboard, quiz},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the quiz and leaderboard sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (session, leaderboard, config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start_quiz))
        .route("/next", post(quiz::next_round))
        .route("/answer", post(quiz::submit_answer))
        .route("/end", post(quiz::end_quiz))
        .route("/elapsed", get(quiz::elapsed))
        .route("/save", post(quiz::save_score));

    let leaderboard_routes = Router::new()
        .route(
            "/",
            get(leaderboard::get_leaderboard).delete(leaderboard::clear_leaderboard),
        )
        .route("/stats", get(leaderboard::get_stats));

    Router::new()
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/api/quiz", quiz_routes)
        .nest("/api/leaderboard", leaderboard_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
