// src/config.rs

use std::env;
use dotenvy::dotenv;
use url::Url;

/// Number of rounds in one quiz session.
pub const TOTAL_ROUNDS: usize = 10;

/// Assumed question count for stored scores that predate the `totalQuestions` field.
pub const DEFAULT_TOTAL_QUESTIONS: u32 = 10;

/// Default size of the leaderboard view.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 5;

/// Blob key under which the score list is stored.
pub const SCORES_KEY: &str = "quiz_scores";

pub const DEFAULT_SUBJECT_API_URL: &str = "https://tyradex.vercel.app/api/v1/pokemon";
pub const DEFAULT_MAX_SUBJECT_ID: u32 = 1025;

/// Which blob store backs the score list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreBackend {
    File,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub rust_log: String,
    pub score_backend: ScoreBackend,
    pub scores_dir: String,
    pub database_url: String,
    pub subject_api_url: Url,
    pub max_subject_id: u32,
    pub total_rounds: usize,
    pub leaderboard_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let score_backend = match env::var("SCORE_BACKEND").as_deref() {
            Ok("sqlite") => ScoreBackend::Sqlite,
            Ok("file") | Err(_) => ScoreBackend::File,
            Ok(other) => panic!("SCORE_BACKEND must be 'file' or 'sqlite', got '{}'", other),
        };

        let scores_dir = env::var("SCORES_DIR")
            .unwrap_or_else(|_| "data".to_string());

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quiz_scores.db?mode=rwc".to_string());

        let subject_api_url = env::var("SUBJECT_API_URL")
            .unwrap_or_else(|_| DEFAULT_SUBJECT_API_URL.to_string());
        let subject_api_url = Url::parse(&subject_api_url)
            .expect("SUBJECT_API_URL must be a valid URL");

        let max_subject_id = parse_var("MAX_SUBJECT_ID", DEFAULT_MAX_SUBJECT_ID);
        let total_rounds = parse_var("TOTAL_ROUNDS", TOTAL_ROUNDS);
        let leaderboard_limit = parse_var("LEADERBOARD_LIMIT", DEFAULT_LEADERBOARD_LIMIT);

        assert!(max_subject_id > 0, "MAX_SUBJECT_ID must be positive");
        assert!(total_rounds > 0, "TOTAL_ROUNDS must be positive");

        Self {
            bind_addr,
            rust_log,
            score_backend,
            scores_dir,
            database_url,
            subject_api_url,
            max_subject_id,
            total_rounds,
            leaderboard_limit,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{} must be a number, got '{}'", name, raw)),
        Err(_) => default,
    }
}
