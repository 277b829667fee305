// src/services/quiz_session.rs

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        round::{AnswerOutcome, NextRound, QuizResults, Round, RoundRecord},
        score::SavedScore,
        subject::Subject,
    },
    services::subject_provider::SubjectProvider,
    utils::{
        matcher,
        time::{Clock, format_time, ms_to_rounded_secs},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Idle,
    Active,
    Completed,
}

/// Side effect fired after every scored round (vibration, sound, metrics...).
pub trait RoundObserver: Send + Sync {
    fn on_round_scored(&self, record: &RoundRecord);
}

const UNSET: i64 = i64::MIN;

/// Start/end timestamps of the current session.
///
/// Shared through an `Arc` so the running timer can be read without waiting
/// on a session operation that is blocked on the subject provider.
#[derive(Debug)]
pub struct SessionTimer {
    started_at_ms: AtomicI64,
    ended_at_ms: AtomicI64,
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self {
            started_at_ms: AtomicI64::new(UNSET),
            ended_at_ms: AtomicI64::new(UNSET),
        }
    }
}

impl SessionTimer {
    pub fn started_at_ms(&self) -> Option<i64> {
        match self.started_at_ms.load(Ordering::SeqCst) {
            UNSET => None,
            ms => Some(ms),
        }
    }

    pub fn ended_at_ms(&self) -> Option<i64> {
        match self.ended_at_ms.load(Ordering::SeqCst) {
            UNSET => None,
            ms => Some(ms),
        }
    }

    /// Seconds since start, frozen once the session has ended. 0 if never started.
    pub fn elapsed_seconds(&self, clock: &dyn Clock) -> u64 {
        let Some(started) = self.started_at_ms() else {
            return 0;
        };
        let until = self.ended_at_ms().unwrap_or_else(|| clock.now_ms());
        ms_to_rounded_secs(until - started)
    }

    /// The new start is written before the old end is cleared, so a reader in
    /// between sees `old_end - new_start`, which clamps to 0.
    fn start(&self, now_ms: i64) {
        self.started_at_ms.store(now_ms, Ordering::SeqCst);
        self.ended_at_ms.store(UNSET, Ordering::SeqCst);
    }

    fn stop(&self, now_ms: i64) {
        self.ended_at_ms.store(now_ms, Ordering::SeqCst);
    }
}

/// State machine for one game of `total_rounds` rounds.
///
/// `Idle -> Active -> Completed`; `start()` from any state begins a fresh game.
/// Callers serialize operations; nothing here is re-entrant.
pub struct QuizSession {
    provider: Arc<dyn SubjectProvider>,
    clock: Arc<dyn Clock>,
    observer: Option<Arc<dyn RoundObserver>>,
    timer: Arc<SessionTimer>,

    total_rounds: usize,
    status: SessionStatus,
    current_round_index: usize,
    score: usize,
    rounds: Vec<RoundRecord>,
    current_subject: Option<Subject>,
    results: Option<QuizResults>,
    saved: Option<SavedScore>,
}

impl QuizSession {
    pub fn new(provider: Arc<dyn SubjectProvider>, clock: Arc<dyn Clock>, total_rounds: usize) -> Self {
        Self {
            provider,
            clock,
            observer: None,
            timer: Arc::new(SessionTimer::default()),
            total_rounds: total_rounds.max(1),
            status: SessionStatus::Idle,
            current_round_index: 0,
            score: 0,
            rounds: Vec::new(),
            current_subject: None,
            results: None,
            saved: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RoundObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Begins a new game and pre-fetches round 1.
    ///
    /// If that fetch fails the session is still `Active`; `load_next_round()`
    /// retries it.
    pub async fn start(&mut self) -> Result<Round, AppError> {
        self.current_round_index = 0;
        self.score = 0;
        self.rounds.clear();
        self.current_subject = None;
        self.results = None;
        self.saved = None;
        self.timer.start(self.clock.now_ms());
        self.status = SessionStatus::Active;
        tracing::info!("Quiz session started ({} rounds)", self.total_rounds);

        self.fetch_round().await
    }

    /// Fetches the next subject, or ends the session once every round is answered.
    ///
    /// An unanswered round is returned again instead of being replaced.
    pub async fn load_next_round(&mut self) -> Result<NextRound, AppError> {
        match self.status {
            SessionStatus::Idle => {
                return Err(AppError::NoActiveSession("Quiz has not been started".to_string()));
            }
            SessionStatus::Completed => {
                return Ok(NextRound::Complete {
                    complete: true,
                    results: self.end()?,
                });
            }
            SessionStatus::Active => {}
        }

        if self.current_round_index >= self.total_rounds {
            return Ok(NextRound::Complete {
                complete: true,
                results: self.end()?,
            });
        }

        if let Some(subject) = &self.current_subject {
            return Ok(NextRound::Round(self.round_for(subject.clone())));
        }

        Ok(NextRound::Round(self.fetch_round().await?))
    }

    async fn fetch_round(&mut self) -> Result<Round, AppError> {
        let subject = self.provider.next().await.map_err(|e| {
            tracing::warn!(
                "Subject fetch failed for round {}: {}",
                self.current_round_index + 1,
                e
            );
            e
        })?;
        self.current_subject = Some(subject.clone());
        Ok(self.round_for(subject))
    }

    fn round_for(&self, subject: Subject) -> Round {
        Round {
            round_number: self.current_round_index + 1,
            total_rounds: self.total_rounds,
            subject,
            progress_percent: 100.0 * (self.current_round_index + 1) as f64
                / self.total_rounds as f64,
        }
    }

    /// Scores an answer against the current subject. One answer per round.
    pub fn submit_answer(&mut self, user_answer: &str) -> Result<AnswerOutcome, AppError> {
        if self.status != SessionStatus::Active {
            return Err(AppError::NoActiveSession("No quiz in progress".to_string()));
        }
        let subject = self
            .current_subject
            .take()
            .ok_or_else(|| AppError::NoActiveSession("No round awaiting an answer".to_string()))?;

        let user_answer = user_answer.trim().to_string();
        let correct_answer = subject.canonical_name.clone();
        let is_correct = matcher::matches(&user_answer, &correct_answer);

        let record = RoundRecord {
            round_number: self.current_round_index + 1,
            subject,
            user_answer: user_answer.clone(),
            correct_answer: correct_answer.clone(),
            is_correct,
            answered_at_epoch_ms: self.clock.now_ms(),
        };

        if let Some(observer) = &self.observer {
            observer.on_round_scored(&record);
        }
        self.rounds.push(record);
        if is_correct {
            self.score += 1;
        }
        self.current_round_index += 1;

        tracing::debug!(
            "Round {}/{} answered, correct: {}",
            self.current_round_index,
            self.total_rounds,
            is_correct
        );

        Ok(AnswerOutcome {
            is_correct,
            correct_answer,
            user_answer,
            current_score: self.score,
            round_number: self.current_round_index,
            total_rounds: self.total_rounds,
            is_session_complete: self.current_round_index >= self.total_rounds,
        })
    }

    /// Closes the session and returns its summary. Repeat calls return the
    /// same summary until the next `start()`.
    pub fn end(&mut self) -> Result<QuizResults, AppError> {
        match self.status {
            SessionStatus::Idle => {
                Err(AppError::NoActiveSession("Quiz has not been started".to_string()))
            }
            SessionStatus::Completed => self
                .results
                .clone()
                .ok_or_else(|| AppError::InternalServerError("Completed session lost its results".to_string())),
            SessionStatus::Active => {
                let ended = self.clock.now_ms();
                self.timer.stop(ended);
                self.status = SessionStatus::Completed;
                self.current_subject = None;

                let started = self.timer.started_at_ms().unwrap_or(ended);
                let total_time_seconds = ms_to_rounded_secs(ended - started);
                let results = QuizResults {
                    score: self.score,
                    total_rounds: self.total_rounds,
                    percentage: (100.0 * self.score as f64 / self.total_rounds as f64).round() as u32,
                    total_time_seconds,
                    formatted_time: format_time(total_time_seconds),
                    rounds: self.rounds.clone(),
                    started_at_epoch_ms: started,
                    ended_at_epoch_ms: ended,
                };
                tracing::info!(
                    "Quiz session ended: {}/{} in {}",
                    results.score,
                    results.total_rounds,
                    results.formatted_time
                );
                self.results = Some(results.clone());
                Ok(results)
            }
        }
    }

    /// The score saved for this game, if any. A game is saved at most once.
    pub fn saved_score(&self) -> Option<&SavedScore> {
        self.saved.as_ref()
    }

    /// Remembers that the completed game has been persisted.
    pub fn record_saved(&mut self, saved: SavedScore) -> Result<(), AppError> {
        if self.status != SessionStatus::Completed {
            return Err(AppError::NoActiveSession("Only a finished quiz can be saved".to_string()));
        }
        self.saved = Some(saved);
        Ok(())
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds(self.clock.as_ref())
    }

    /// Handle for reading the timer without holding the session.
    pub fn timer(&self) -> Arc<SessionTimer> {
        Arc::clone(&self.timer)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn current_round_index(&self) -> usize {
        self.current_round_index
    }

    pub fn total_rounds(&self) -> usize {
        self.total_rounds
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    pub fn current_subject(&self) -> Option<&Subject> {
        self.current_subject.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{services::subject_provider::FixedSubjectProvider, utils::time::ManualClock};

    const NAMES: [&str; 10] = [
        "Pikachu", "Salamèche", "Carapuce", "Bulbizarre", "Évoli",
        "Rondoudou", "Miaouss", "Psykokwak", "Ronflex", "Mewtwo",
    ];

    fn setup() -> (QuizSession, Arc<FixedSubjectProvider>, Arc<ManualClock>) {
        let provider = Arc::new(FixedSubjectProvider::from_names(&NAMES));
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        let session = QuizSession::new(provider.clone(), clock.clone(), 10);
        (session, provider, clock)
    }

    /// Answers every round, getting the first `correct` right.
    async fn play(session: &mut QuizSession, clock: &ManualClock, correct: usize) {
        for i in 0..session.total_rounds() {
            if i > 0 {
                session.load_next_round().await.unwrap();
            }
            let name = session.current_subject().unwrap().canonical_name.clone();
            let answer = if i < correct { name } else { "nope".to_string() };
            clock.advance_ms(12_500);
            session.submit_answer(&answer).unwrap();
        }
    }

    #[tokio::test]
    async fn test_start_prefetches_first_round() {
        let (mut session, _, _) = setup();
        assert_eq!(session.status(), SessionStatus::Idle);

        let round = session.start().await.unwrap();
        assert_eq!(round.round_number, 1);
        assert_eq!(round.total_rounds, 10);
        assert_eq!(round.progress_percent, 10.0);
        assert_eq!(round.subject.canonical_name, "Pikachu");
        assert!(session.is_active());
        assert_eq!(session.current_subject().unwrap().canonical_name, "Pikachu");
    }

    #[tokio::test]
    async fn test_full_session_seven_correct() {
        let (mut session, _, clock) = setup();
        session.start().await.unwrap();
        play(&mut session, &clock, 7).await;

        assert_eq!(session.current_round_index(), 10);
        assert_eq!(session.score(), 7);
        assert_eq!(
            session.rounds().iter().filter(|r| r.is_correct).count(),
            session.score()
        );

        let results = session.end().unwrap();
        assert_eq!(results.score, 7);
        assert_eq!(results.percentage, 70);
        assert_eq!(results.total_time_seconds, 125);
        assert_eq!(results.formatted_time, "2:05");
        assert_eq!(results.rounds.len(), 10);
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_last_answer_reports_completion() {
        let (mut session, _, _) = setup();
        session.start().await.unwrap();
        for i in 0..10 {
            if i > 0 {
                session.load_next_round().await.unwrap();
            }
            let outcome = session.submit_answer("x").unwrap();
            assert_eq!(outcome.round_number, i + 1);
            assert_eq!(outcome.is_session_complete, i == 9);
        }
    }

    #[tokio::test]
    async fn test_round_cannot_be_answered_twice() {
        let (mut session, _, _) = setup();
        session.start().await.unwrap();
        session.submit_answer("Pikachu").unwrap();

        let err = session.submit_answer("Pikachu").unwrap_err();
        assert!(matches!(err, AppError::NoActiveSession(_)));
        assert_eq!(session.rounds().len(), 1);
        assert_eq!(session.score(), 1);
    }

    #[tokio::test]
    async fn test_submit_without_session() {
        let (mut session, _, _) = setup();
        assert!(matches!(
            session.submit_answer("Pikachu"),
            Err(AppError::NoActiveSession(_))
        ));
        assert_eq!(session.current_round_index(), 0);
    }

    #[tokio::test]
    async fn test_answer_outcome_payload() {
        let (mut session, _, _) = setup();
        session.start().await.unwrap();
        let outcome = session.submit_answer("  PIKACHU! ").unwrap();
        assert!(outcome.is_correct);
        assert_eq!(outcome.user_answer, "PIKACHU!");
        assert_eq!(outcome.correct_answer, "Pikachu");
        assert_eq!(outcome.current_score, 1);
        assert_eq!(outcome.round_number, 1);
        assert!(!outcome.is_session_complete);

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["isCorrect"], true);
        assert_eq!(json["isSessionComplete"], false);
        assert_eq!(json["totalRounds"], 10);
    }

    #[tokio::test]
    async fn test_load_next_after_last_round_ends() {
        let (mut session, _, clock) = setup();
        session.start().await.unwrap();
        play(&mut session, &clock, 3).await;

        match session.load_next_round().await.unwrap() {
            NextRound::Complete { results, .. } => assert_eq!(results.score, 3),
            NextRound::Round(_) => panic!("expected completion"),
        }
        assert_eq!(session.status(), SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_unanswered_round_is_not_replaced() {
        let (mut session, _, _) = setup();
        session.start().await.unwrap();
        match session.load_next_round().await.unwrap() {
            NextRound::Round(round) => {
                assert_eq!(round.round_number, 1);
                assert_eq!(round.subject.canonical_name, "Pikachu");
            }
            NextRound::Complete { .. } => panic!("expected a round"),
        }
    }

    #[tokio::test]
    async fn test_end_is_idempotent() {
        let (mut session, _, clock) = setup();
        session.start().await.unwrap();
        session.submit_answer("Pikachu").unwrap();
        clock.advance_secs(30);

        let first = session.end().unwrap();
        clock.advance_secs(30);
        let second = session.end().unwrap();
        assert_eq!(first, second);
        assert_eq!(session.elapsed_seconds(), 30);
    }

    #[tokio::test]
    async fn test_end_before_start_fails() {
        let (mut session, _, _) = setup();
        assert!(matches!(session.end(), Err(AppError::NoActiveSession(_))));
    }

    #[tokio::test]
    async fn test_elapsed_seconds() {
        let (mut session, _, clock) = setup();
        assert_eq!(session.elapsed_seconds(), 0);
        session.start().await.unwrap();
        clock.advance_ms(41_600);
        assert_eq!(session.elapsed_seconds(), 42);
        assert_eq!(session.timer().elapsed_seconds(clock.as_ref()), 42);
    }

    #[tokio::test]
    async fn test_provider_failure_is_recoverable() {
        let (mut session, provider, _) = setup();
        provider.set_failing(true);

        assert!(matches!(session.start().await, Err(AppError::ProviderError(_))));
        assert!(session.is_active());
        assert!(session.current_subject().is_none());
        assert!(matches!(
            session.submit_answer("Pikachu"),
            Err(AppError::NoActiveSession(_))
        ));

        provider.set_failing(false);
        match session.load_next_round().await.unwrap() {
            NextRound::Round(round) => assert_eq!(round.round_number, 1),
            NextRound::Complete { .. } => panic!("expected a round"),
        }
    }

    #[tokio::test]
    async fn test_restart_discards_previous_game() {
        let (mut session, _, clock) = setup();
        session.start().await.unwrap();
        session.submit_answer("Pikachu").unwrap();
        session.end().unwrap();

        clock.advance_secs(100);
        session.start().await.unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.current_round_index(), 0);
        assert!(session.rounds().is_empty());
        assert_eq!(session.elapsed_seconds(), 0);
    }

    fn saved_score(results: &QuizResults) -> SavedScore {
        SavedScore {
            entry: crate::models::score::ScoreEntry {
                name: "Ash".to_string(),
                score: results.score as u32,
                time: results.total_time_seconds,
                date: "2024-05-01T12:00:00.000Z".to_string(),
                id: 1,
                total_questions: results.total_rounds as u32,
                percentage: results.percentage,
            },
            rank: 1,
            medal: "🥇".to_string(),
            message: "top".to_string(),
        }
    }

    #[tokio::test]
    async fn test_saved_score_kept_until_restart() {
        let (mut session, _, _) = setup();
        session.start().await.unwrap();
        session.submit_answer("Pikachu").unwrap();
        let results = session.end().unwrap();
        assert!(session.record_saved(saved_score(&results)).is_ok());
        assert_eq!(session.saved_score().unwrap().entry.name, "Ash");

        session.start().await.unwrap();
        assert!(session.saved_score().is_none());
    }

    #[tokio::test]
    async fn test_record_saved_requires_completed_game() {
        let (mut session, _, _) = setup();
        session.start().await.unwrap();
        let results = QuizResults {
            score: 0,
            total_rounds: 10,
            percentage: 0,
            total_time_seconds: 0,
            formatted_time: "0:00".to_string(),
            rounds: Vec::new(),
            started_at_epoch_ms: 0,
            ended_at_epoch_ms: 0,
        };
        assert!(matches!(
            session.record_saved(saved_score(&results)),
            Err(AppError::NoActiveSession(_))
        ));
        assert!(session.is_active());
    }

    #[test]
    fn test_timer_restart_clears_previous_end() {
        let timer = SessionTimer::default();
        timer.start(1_000);
        timer.stop(61_000);
        timer.start(500_000);
        assert_eq!(timer.started_at_ms(), Some(500_000));
        assert_eq!(timer.ended_at_ms(), None);

        // Old end with new start, as a reader could see mid-restart.
        let torn = SessionTimer::default();
        torn.start(500_000);
        torn.stop(61_000);
        let clock = ManualClock::new(Utc.timestamp_millis_opt(900_000).unwrap());
        assert_eq!(torn.elapsed_seconds(&clock), 0);
    }

    struct Recorder(Mutex<Vec<(usize, bool)>>);

    impl RoundObserver for Recorder {
        fn on_round_scored(&self, record: &RoundRecord) {
            self.0.lock().unwrap().push((record.round_number, record.is_correct));
        }
    }

    #[tokio::test]
    async fn test_observer_sees_each_round() {
        let (session, _, _) = setup();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut session = session.with_observer(recorder.clone());

        session.start().await.unwrap();
        session.submit_answer("Pikachu").unwrap();
        session.load_next_round().await.unwrap();
        session.submit_answer("wrong").unwrap();

        assert_eq!(*recorder.0.lock().unwrap(), vec![(1, true), (2, false)]);
    }
}
