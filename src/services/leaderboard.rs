// src/services/leaderboard.rs

use std::{cmp::Ordering, collections::HashSet, sync::Arc};

use chrono::SecondsFormat;

use crate::{
    error::AppError,
    models::{
        round::QuizResults,
        score::{LeaderboardStats, RankedScore, SavedScore, ScoreEntry, StoredScore},
    },
    services::score_store::ScoreStore,
    utils::{
        html::clean_player_name,
        time::{Clock, format_relative_date, format_time},
    },
};

/// Labels for the podium ranks. Rank 4 and below render as `#n`.
#[derive(Debug, Clone)]
pub struct MedalSet {
    pub first: String,
    pub second: String,
    pub third: String,
}

impl Default for MedalSet {
    fn default() -> Self {
        Self {
            first: "🥇".to_string(),
            second: "🥈".to_string(),
            third: "🥉".to_string(),
        }
    }
}

impl MedalSet {
    pub fn label(&self, rank: usize) -> String {
        match rank {
            1 => self.first.clone(),
            2 => self.second.clone(),
            3 => self.third.clone(),
            n => format!("#{}", n),
        }
    }
}

/// Sorts by score descending, then time ascending.
/// `sort_by` is stable, so full ties keep insertion order.
pub fn rank_entries(mut entries: Vec<ScoreEntry>) -> Vec<ScoreEntry> {
    entries.sort_by(ranking_order);
    entries
}

/// Higher score first, then faster time. Full ties compare equal.
pub fn ranking_order(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.score.cmp(&a.score).then(a.time.cmp(&b.time))
}

/// Read-side view over the score store: rankings, stats, messages.
/// Holds no state of its own besides the store handle.
pub struct LeaderboardEngine {
    store: Arc<dyn ScoreStore>,
    clock: Arc<dyn Clock>,
    medals: MedalSet,
}

impl LeaderboardEngine {
    pub fn new(store: Arc<dyn ScoreStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            medals: MedalSet::default(),
        }
    }

    pub fn with_medals(mut self, medals: MedalSet) -> Self {
        self.medals = medals;
        self
    }

    pub fn medal(&self, rank: usize) -> String {
        self.medals.label(rank)
    }

    /// Every stored entry in insertion order. An unreadable store is treated
    /// as empty so the leaderboard always renders.
    async fn load_entries(&self) -> Vec<ScoreEntry> {
        match self.store.get_all().await {
            Ok(scores) => scores.into_iter().map(ScoreEntry::from).collect(),
            Err(e) => {
                tracing::warn!("Score store unreadable, showing empty leaderboard: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn top_scores(&self, limit: usize) -> Vec<RankedScore> {
        let now = self.clock.now();
        rank_entries(self.load_entries().await)
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, entry)| {
                let rank = i + 1;
                RankedScore {
                    rank,
                    medal: self.medal(rank),
                    formatted_time: format_time(entry.time),
                    formatted_date: format_relative_date(&entry.date, now),
                    name: entry.name,
                    score: entry.score,
                    total_questions: entry.total_questions,
                    percentage: entry.percentage,
                    time: entry.time,
                    date: entry.date,
                }
            })
            .collect()
    }

    pub async fn stats(&self) -> LeaderboardStats {
        let entries = self.load_entries().await;
        if entries.is_empty() {
            return LeaderboardStats {
                total_games: 0,
                average_score: 0.0,
                best_score: 0,
                best_time: 0,
                formatted_best_time: format_time(0),
                total_players: 0,
            };
        }

        let total_games = entries.len();
        let sum: u64 = entries.iter().map(|e| e.score as u64).sum();
        let average = sum as f64 / total_games as f64;
        let best_score = entries.iter().map(|e| e.score).max().unwrap_or(0);
        let best_time = entries.iter().map(|e| e.time).min().unwrap_or(0);
        let total_players = entries
            .iter()
            .map(|e| e.name.to_lowercase())
            .collect::<HashSet<_>>()
            .len();

        LeaderboardStats {
            total_games,
            average_score: (average * 100.0).round() / 100.0,
            best_score,
            best_time,
            formatted_best_time: format_time(best_time),
            total_players,
        }
    }

    /// Feedback line for a finished game. Rank tiers win over percentage tiers.
    pub fn congratulation_message(&self, score: usize, total_rounds: usize, rank: usize) -> String {
        let percentage = if total_rounds == 0 {
            0.0
        } else {
            100.0 * score as f64 / total_rounds as f64
        };

        match rank {
            1 => "🏆 New record! You are the best trainer!".to_string(),
            2 | 3 => format!("{} Excellent! You made the podium!", self.medal(rank)),
            4 | 5 => "⭐ Very good! You are in the top 5!".to_string(),
            _ if percentage >= 80.0 => "👏 Bravo! Excellent score!".to_string(),
            _ if percentage >= 60.0 => "👍 Well played! Good result!".to_string(),
            _ if percentage >= 40.0 => "💪 Not bad! Keep practicing!".to_string(),
            _ => "🎯 Still some training to do, but don't give up!".to_string(),
        }
    }

    /// Persists a finished game under `name` and reports where it landed.
    ///
    /// Store failures are returned, never swallowed: a lost score must be visible.
    pub async fn save_result(&self, name: &str, results: &QuizResults) -> Result<SavedScore, AppError> {
        let name = clean_player_name(name);
        if name.is_empty() {
            return Err(AppError::ValidationError("Player name must not be empty".to_string()));
        }

        let now = self.clock.now();
        let entry = ScoreEntry {
            name,
            score: results.score as u32,
            time: results.total_time_seconds,
            date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            id: now.timestamp_millis(),
            total_questions: results.total_rounds as u32,
            percentage: results.percentage,
        };

        self.store.append(StoredScore::from(entry.clone())).await?;

        // The new entry is the last one inserted; find where the stable sort puts it.
        let all: Vec<ScoreEntry> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .map(ScoreEntry::from)
            .collect();
        let newest = all.len().saturating_sub(1);
        let mut order: Vec<(usize, &ScoreEntry)> = all.iter().enumerate().collect();
        order.sort_by(|(_, a), (_, b)| ranking_order(a, b));
        let rank = order
            .iter()
            .position(|&(i, _)| i == newest)
            .map(|p| p + 1)
            .unwrap_or(all.len().max(1));

        tracing::info!(
            "Saved score for '{}': {}/{} in {}s (rank {})",
            entry.name,
            entry.score,
            entry.total_questions,
            entry.time,
            rank
        );

        Ok(SavedScore {
            medal: self.medal(rank),
            message: self.congratulation_message(results.score, results.total_rounds, rank),
            entry,
            rank,
        })
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        services::score_store::{JsonScoreStore, MemoryBlobStore},
        utils::time::ManualClock,
    };

    fn stored(name: &str, score: u32, time: u64, date: &str) -> StoredScore {
        StoredScore {
            name: name.to_string(),
            score,
            time,
            date: date.to_string(),
            id: 0,
            total_questions: None,
            percentage: None,
        }
    }

    fn engine_with(blobs: Arc<MemoryBlobStore>) -> LeaderboardEngine {
        let store = Arc::new(JsonScoreStore::new(blobs, "scores"));
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()));
        LeaderboardEngine::new(store, clock)
    }

    async fn seeded(scores: &[StoredScore]) -> LeaderboardEngine {
        let blobs = Arc::new(MemoryBlobStore::new());
        let engine = engine_with(blobs);
        for s in scores {
            engine.store.append(s.clone()).await.unwrap();
        }
        engine
    }

    fn results(score: usize, secs: u64) -> QuizResults {
        QuizResults {
            score,
            total_rounds: 10,
            percentage: (score * 10) as u32,
            total_time_seconds: secs,
            formatted_time: format_time(secs),
            rounds: Vec::new(),
            started_at_epoch_ms: 0,
            ended_at_epoch_ms: secs as i64 * 1000,
        }
    }

    #[tokio::test]
    async fn test_ash_misty_scenario() {
        let date = "2024-06-15T09:00:00.000Z";
        let engine = seeded(&[
            stored("Ash", 8, 120, date),
            stored("Ash", 8, 90, date),
            stored("Misty", 9, 200, date),
        ])
        .await;

        let top = engine.top_scores(3).await;
        let rows: Vec<_> = top.iter().map(|r| (r.name.as_str(), r.score, r.time, r.rank)).collect();
        assert_eq!(
            rows,
            [("Misty", 9, 200, 1), ("Ash", 8, 90, 2), ("Ash", 8, 120, 3)]
        );
        assert_eq!(top[0].medal, "🥇");
        assert_eq!(top[2].medal, "🥉");

        let stats = engine.stats().await;
        assert_eq!(stats.total_players, 2);
        assert_eq!(stats.best_score, 9);
        assert_eq!(stats.best_time, 90);
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.average_score, 8.33);
        assert_eq!(stats.formatted_best_time, "1:30");
    }

    #[tokio::test]
    async fn test_full_ties_keep_insertion_order() {
        let date = "2024-06-15T09:00:00.000Z";
        let engine = seeded(&[
            stored("First", 5, 60, date),
            stored("Second", 5, 60, date),
            stored("Fast", 5, 30, date),
            stored("Third", 5, 60, date),
        ])
        .await;

        let names: Vec<_> = engine.top_scores(10).await.into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["Fast", "First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_ranking_is_total_order() {
        let date = "2024-06-15T09:00:00.000Z";
        let raw = [(3, 50), (7, 80), (7, 40), (10, 300), (0, 10), (7, 40), (3, 20)];
        let scores: Vec<_> = raw.iter().map(|&(s, t)| stored("p", s, t, date)).collect();
        let engine = seeded(&scores).await;

        let top = engine.top_scores(raw.len()).await;
        assert_eq!(top.len(), raw.len());
        for pair in top.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(b.score < a.score || (b.score == a.score && b.time >= a.time));
        }
        assert!(top.iter().enumerate().all(|(i, r)| r.rank == i + 1));
        assert_eq!(top[4].medal, "#5");
    }

    #[tokio::test]
    async fn test_limit_applies() {
        let date = "2024-06-15T09:00:00.000Z";
        let scores: Vec<_> = (0..8).map(|i| stored("p", i, 10, date)).collect();
        let engine = seeded(&scores).await;
        assert_eq!(engine.top_scores(5).await.len(), 5);
        assert_eq!(engine.top_scores(5).await[0].score, 7);
    }

    #[tokio::test]
    async fn test_legacy_fields_defaulted_in_view() {
        let engine = seeded(&[stored("Brock", 6, 75, "garbage")]).await;
        let top = engine.top_scores(1).await;
        assert_eq!(top[0].total_questions, 10);
        assert_eq!(top[0].percentage, 60);
        assert_eq!(top[0].formatted_time, "1:15");
        assert_eq!(top[0].formatted_date, "Unknown date");
    }

    #[tokio::test]
    async fn test_empty_store_stats() {
        let engine = seeded(&[]).await;
        let stats = engine.stats().await;
        assert_eq!(stats.total_games, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.best_score, 0);
        assert_eq!(stats.best_time, 0);
        assert_eq!(stats.total_players, 0);
        assert!(engine.top_scores(5).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_store_renders_empty() {
        let blobs = Arc::new(MemoryBlobStore::with_blob("scores", "not json"));
        let engine = engine_with(blobs.clone());
        assert!(engine.top_scores(5).await.is_empty());
        assert_eq!(engine.stats().await.total_games, 0);

        blobs.set_fail_reads(true);
        assert!(engine.top_scores(5).await.is_empty());
    }

    #[tokio::test]
    async fn test_players_counted_case_insensitively() {
        let date = "2024-06-15T09:00:00.000Z";
        let engine = seeded(&[
            stored("Ash", 1, 10, date),
            stored("ASH", 2, 10, date),
            stored("ash", 3, 10, date),
            stored("Misty", 4, 10, date),
        ])
        .await;
        assert_eq!(engine.stats().await.total_players, 2);
    }

    #[test]
    fn test_congratulation_tiers() {
        let engine = engine_with(Arc::new(MemoryBlobStore::new()));
        assert!(engine.congratulation_message(2, 10, 1).contains("New record"));
        assert!(engine.congratulation_message(2, 10, 2).contains("podium"));
        assert!(engine.congratulation_message(2, 10, 3).starts_with("🥉"));
        assert!(engine.congratulation_message(2, 10, 5).contains("top 5"));
        assert!(engine.congratulation_message(8, 10, 6).contains("Excellent score"));
        assert!(engine.congratulation_message(6, 10, 6).contains("Good result"));
        assert!(engine.congratulation_message(4, 10, 6).contains("Keep practicing"));
        assert!(engine.congratulation_message(3, 10, 6).contains("don't give up"));
    }

    #[test]
    fn test_custom_medals() {
        let engine = engine_with(Arc::new(MemoryBlobStore::new())).with_medals(MedalSet {
            first: "1st".into(),
            second: "2nd".into(),
            third: "3rd".into(),
        });
        assert_eq!(engine.medal(3), "3rd");
        assert_eq!(engine.medal(4), "#4");
    }

    #[tokio::test]
    async fn test_save_result_reports_rank() {
        let date = "2024-06-15T09:00:00.000Z";
        let engine = seeded(&[stored("Misty", 9, 200, date), stored("Brock", 8, 50, date)]).await;

        let saved = engine.save_result("  Ash ", &results(8, 50)).await.unwrap();
        assert_eq!(saved.entry.name, "Ash");
        assert_eq!(saved.entry.percentage, 80);
        assert_eq!(saved.entry.total_questions, 10);
        assert_eq!(saved.entry.date, "2024-06-15T10:00:00.000Z");
        // Same score and time as Brock, inserted later.
        assert_eq!(saved.rank, 3);
        assert_eq!(saved.medal, "🥉");
        assert!(saved.message.contains("podium"));

        let top = engine.top_scores(5).await;
        assert_eq!(top[2].name, "Ash");
        assert_eq!(top[2].formatted_date, "Today");
    }

    #[tokio::test]
    async fn test_saved_rank_matches_leaderboard_position() {
        let date = "2024-06-15T09:00:00.000Z";
        let engine = seeded(&[
            stored("Gary", 6, 30, date),
            stored("Misty", 9, 200, date),
            stored("Brock", 6, 30, date),
            stored("Erika", 6, 45, date),
        ])
        .await;

        let saved = engine.save_result("Ash", &results(6, 30)).await.unwrap();
        let top = engine.top_scores(10).await;
        assert_eq!(top[saved.rank - 1].name, "Ash");
        assert_eq!(saved.rank, 4);
        assert_eq!(saved.medal, "#4");
    }

    #[tokio::test]
    async fn test_save_rejects_blank_name() {
        let engine = seeded(&[]).await;
        let err = engine.save_result("   ", &results(5, 60)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(engine.top_scores(5).await.is_empty());
    }

    #[tokio::test]
    async fn test_save_surfaces_write_failure() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let engine = engine_with(blobs.clone());
        blobs.set_fail_writes(true);
        let err = engine.save_result("Ash", &results(5, 60)).await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceError(_)));
    }

    #[tokio::test]
    async fn test_clear() {
        let engine = seeded(&[stored("Ash", 5, 60, "2024-06-15T09:00:00.000Z")]).await;
        engine.clear().await.unwrap();
        assert!(engine.top_scores(5).await.is_empty());
    }
}
