// src/models/score.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{config::DEFAULT_TOTAL_QUESTIONS, models::player_name};

/// One saved session as it sits in the persisted JSON array.
///
/// Older lists lack `totalQuestions` and `percentage`; both are optional here
/// and filled in by [`ScoreEntry::from`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScore {
    pub name: String,
    pub score: u32,
    /// Seconds.
    pub time: u64,
    /// ISO-8601.
    pub date: String,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
}

/// A stored score with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    pub time: u64,
    pub date: String,
    pub id: i64,
    pub total_questions: u32,
    pub percentage: u32,
}

impl From<StoredScore> for ScoreEntry {
    fn from(s: StoredScore) -> Self {
        let percentage = s.percentage.unwrap_or_else(|| {
            (100.0 * s.score as f64 / DEFAULT_TOTAL_QUESTIONS as f64).round() as u32
        });
        Self {
            name: s.name,
            score: s.score,
            time: s.time,
            date: s.date,
            id: s.id,
            total_questions: s.total_questions.unwrap_or(DEFAULT_TOTAL_QUESTIONS),
            percentage,
        }
    }
}

impl From<ScoreEntry> for StoredScore {
    fn from(e: ScoreEntry) -> Self {
        Self {
            name: e.name,
            score: e.score,
            time: e.time,
            date: e.date,
            id: e.id,
            total_questions: Some(e.total_questions),
            percentage: Some(e.percentage),
        }
    }
}

/// A leaderboard row: a score entry plus its rank and display fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedScore {
    pub rank: usize,
    pub medal: String,
    pub name: String,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub time: u64,
    pub formatted_time: String,
    pub date: String,
    pub formatted_date: String,
}

/// Aggregates over every stored score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStats {
    pub total_games: usize,
    pub average_score: f64,
    pub best_score: u32,
    pub best_time: u64,
    pub formatted_best_time: String,
    pub total_players: usize,
}

/// Returned after a score is saved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScore {
    pub entry: ScoreEntry,
    /// Position of the new entry in the full ranking.
    pub rank: usize,
    pub medal: String,
    pub message: String,
}

/// DTO for saving the finished session under a player name.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveScoreRequest {
    #[validate(custom(function = player_name), length(max = 50))]
    pub name: String,
}

/// Query string for the leaderboard view.
#[derive(Debug, Deserialize, Validate)]
pub struct LeaderboardQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}
