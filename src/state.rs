use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    services::{
        leaderboard::LeaderboardEngine,
        quiz_session::{QuizSession, SessionTimer},
        score_store::{BlobStore, JsonScoreStore},
        subject_provider::SubjectProvider,
    },
    utils::time::Clock,
};

/// The single player's session plus the leaderboard.
///
/// The mutex serializes session operations, including the awaited subject
/// fetch. The timer handle is read without taking it.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<QuizSession>>,
    pub timer: Arc<SessionTimer>,
    pub leaderboard: Arc<LeaderboardEngine>,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        provider: Arc<dyn SubjectProvider>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let session = QuizSession::new(provider, clock.clone(), config.total_rounds);
        let timer = session.timer();
        let store = Arc::new(JsonScoreStore::new(blobs, crate::config::SCORES_KEY));
        let leaderboard = LeaderboardEngine::new(store, clock.clone());

        Self {
            session: Arc::new(Mutex::new(session)),
            timer,
            leaderboard: Arc::new(leaderboard),
            clock,
            config,
        }
    }
}

impl FromRef<AppState> for Arc<LeaderboardEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.leaderboard.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
