// src/services/mod.rs

pub mod leaderboard;
pub mod quiz_session;
pub mod score_store;
pub mod subject_provider;
