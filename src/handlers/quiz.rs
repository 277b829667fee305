// src/handlers/quiz.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        round::{ElapsedResponse, SubmitAnswerRequest},
        score::SaveScoreRequest,
    },
    state::AppState,
    utils::time::format_time,
};

/// Starts a new quiz, discarding any game in progress.
/// Returns round 1.
pub async fn start_quiz(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut session = state.session.lock().await;
    let round = session.start().await?;
    Ok(Json(round))
}

/// Loads the next round, or the final summary once all rounds are answered.
pub async fn next_round(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut session = state.session.lock().await;
    let next = session.load_next_round().await?;
    Ok(Json(next))
}

/// Submits the player's answer for the current round.
///
/// Blank answers are rejected here and never reach the session.
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }

    let mut session = state.session.lock().await;
    let outcome = session.submit_answer(&req.answer)?;
    Ok(Json(outcome))
}

/// Ends the quiz and returns the summary. Safe to call repeatedly.
pub async fn end_quiz(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut session = state.session.lock().await;
    let results = session.end()?;
    Ok(Json(results))
}

/// Running timer. Does not wait for the session lock.
pub async fn elapsed(State(state): State<AppState>) -> impl IntoResponse {
    let elapsed_seconds = state.timer.elapsed_seconds(state.clock.as_ref());
    Json(ElapsedResponse {
        elapsed_seconds,
        formatted_time: format_time(elapsed_seconds),
    })
}

/// Saves the finished game under the given player name.
///
/// * Validates the name before touching the session or the store.
/// * Ends the session if the player saves before the last round (idempotent otherwise).
/// * Returns the stored entry, its rank and a congratulation message.
/// * A game is stored once; saving it again returns the first result.
pub async fn save_score(
    State(state): State<AppState>,
    Json(req): Json<SaveScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::ValidationError(validation_errors.to_string()));
    }

    // Held across the store write so concurrent saves of one game append once.
    let mut session = state.session.lock().await;
    if let Some(saved) = session.saved_score() {
        tracing::info!("Score for this game already saved, returning rank {}", saved.rank);
        return Ok(Json(saved.clone()));
    }

    let results = session.end()?;
    let saved = state.leaderboard.save_result(&req.name, &results).await?;
    session.record_saved(saved.clone())?;
    Ok(Json(saved))
}
