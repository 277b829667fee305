// src/models/round.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{not_blank, subject::Subject};

/// One answered round. Created once per submitted answer, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    /// 1-based.
    pub round_number: usize,
    pub subject: Subject,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub answered_at_epoch_ms: i64,
}

/// Metadata for a freshly loaded round, sent to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub round_number: usize,
    pub total_rounds: usize,
    pub subject: Subject,
    pub progress_percent: f64,
}

/// Feedback for a submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_answer: String,
    /// The answer as typed, trimmed.
    pub user_answer: String,
    pub current_score: usize,
    /// Number of rounds answered so far.
    pub round_number: usize,
    pub total_rounds: usize,
    pub is_session_complete: bool,
}

/// Summary produced when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResults {
    pub score: usize,
    pub total_rounds: usize,
    pub percentage: u32,
    pub total_time_seconds: u64,
    pub formatted_time: String,
    pub rounds: Vec<RoundRecord>,
    pub started_at_epoch_ms: i64,
    pub ended_at_epoch_ms: i64,
}

/// Result of asking for the next round: either a round to play or the final summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NextRound {
    Round(Round),
    Complete { complete: bool, results: QuizResults },
}

/// Running timer payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElapsedResponse {
    pub elapsed_seconds: u64,
    pub formatted_time: String,
}

/// DTO for submitting an answer to the current round.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(custom(function = not_blank), length(max = 100))]
    pub answer: String,
}
