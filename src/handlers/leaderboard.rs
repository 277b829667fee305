// src/handlers/leaderboard.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::Config, error::AppError, models::score::LeaderboardQuery,
    services::leaderboard::LeaderboardEngine,
};

/// Retrieves the top scores (default limit from config).
pub async fn get_leaderboard(
    State(engine): State<Arc<LeaderboardEngine>>,
    State(config): State<Config>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = query.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }

    let limit = query.limit.unwrap_or(config.leaderboard_limit);
    Ok(Json(engine.top_scores(limit).await))
}

/// Aggregate statistics over every saved game.
pub async fn get_stats(State(engine): State<Arc<LeaderboardEngine>>) -> impl IntoResponse {
    Json(engine.stats().await)
}

/// Deletes every saved score.
pub async fn clear_leaderboard(
    State(engine): State<Arc<LeaderboardEngine>>,
) -> Result<impl IntoResponse, AppError> {
    engine.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
