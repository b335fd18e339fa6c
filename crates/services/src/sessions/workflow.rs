use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use quest_core::model::{EmployeeId, Scoreboard, SessionContext, SessionToken};

use super::questions::QuestionGenerator;
use super::reveal::{DEFAULT_REVEAL_DELAY, PendingReveal, RevealCanceller, RevealOutcome, RevealTimer};
use super::sampler::SessionSampler;
use super::service::{AnswerOutcome, Finalized, QuizSession};
use crate::directory::DirectoryProvider;
use crate::error::SessionError;
use crate::score_service::ScoreService;

/// Result of a processed answer or skip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    pub outcome: AnswerOutcome,
    /// Updated scoreboard when this answer finished the session and the score
    /// was saved.
    pub scoreboard: Option<Scoreboard>,
}

/// Correctness of a submitted answer, shown while the reveal timer runs.
#[derive(Debug)]
pub struct Reveal {
    pub employee_id: EmployeeId,
    pub chosen: usize,
    pub answer_index: usize,
    pub correct: bool,
    /// Await this, then hand the outcome to `SessionLoopService::complete`.
    pub pending: PendingReveal,
}

/// What `complete` did with a reveal outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Advanced(AnswerResult),
    /// The reveal was cancelled or belongs to a session that was reset since.
    Discarded,
}

#[derive(Debug, Clone, Copy)]
struct PendingAnswer {
    token: SessionToken,
    choice: usize,
}

/// One quiz being played: the state machine, what it was played against, and
/// the answer waiting on its reveal.
#[derive(Debug)]
pub struct ActiveSession {
    quiz: QuizSession,
    context: SessionContext,
    timer: RevealTimer,
    pending: Option<PendingAnswer>,
    unsaved: Option<Finalized>,
}

impl ActiveSession {
    #[must_use]
    pub fn quiz(&self) -> &QuizSession {
        &self.quiz
    }

    #[must_use]
    pub fn is_revealing(&self) -> bool {
        self.pending.is_some()
    }

    /// Finished score that has not been saved yet.
    #[must_use]
    pub fn unsaved_score(&self) -> Option<Finalized> {
        self.unsaved
    }

    /// Cancels the pending reveal from another task.
    #[must_use]
    pub fn canceller(&self) -> RevealCanceller {
        self.timer.canceller()
    }
}

/// Orchestrates a session from directory fetch to saved score.
#[derive(Clone)]
pub struct SessionLoopService {
    directory: Arc<dyn DirectoryProvider>,
    scores: Arc<ScoreService>,
    sampler: SessionSampler,
    generator: QuestionGenerator,
    reveal_delay: Duration,
    seed: Option<u64>,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryProvider>, scores: Arc<ScoreService>) -> Self {
        Self {
            directory,
            scores,
            sampler: SessionSampler::default(),
            generator: QuestionGenerator::default(),
            reveal_delay: DEFAULT_REVEAL_DELAY,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_sampler(mut self, sampler: SessionSampler) -> Self {
        self.sampler = sampler;
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: QuestionGenerator) -> Self {
        self.generator = generator;
        self
    }

    #[must_use]
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }

    /// Fix the random source so every session plays out the same way.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn scores(&self) -> Arc<ScoreService> {
        Arc::clone(&self.scores)
    }

    #[must_use]
    pub fn directory(&self) -> Arc<dyn DirectoryProvider> {
        Arc::clone(&self.directory)
    }

    /// Fetch the department's employees, draw a roster and ask the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Directory` if the fetch fails and
    /// `SessionError::Question` if the first question cannot be built.
    pub async fn start_session(&self, context: SessionContext) -> Result<ActiveSession, SessionError> {
        let pool = self
            .directory
            .fetch_employees(context.company, context.department, self.sampler.desired_count())
            .await?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let fetched = pool.len();
        let roster = self.sampler.sample(pool, &mut rng);
        tracing::debug!(fetched, sampled = roster.len(), "roster drawn");

        let mut quiz = QuizSession::new(self.generator.clone(), rng);
        quiz.start(roster)?;

        Ok(ActiveSession {
            quiz,
            context,
            timer: RevealTimer::new(self.reveal_delay),
            pending: None,
            unsaved: None,
        })
    }

    /// Pick a choice for the current question and arm the reveal timer.
    ///
    /// Nothing is scored until the reveal fires and `complete` is called.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RevealPending` while an earlier answer is being
    /// revealed and `SessionError::InvalidTransition` unless a question is up.
    pub fn submit(&self, session: &mut ActiveSession, choice: usize) -> Result<Reveal, SessionError> {
        if session.pending.is_some() {
            return Err(SessionError::RevealPending);
        }
        let question = session
            .quiz
            .current_question()
            .ok_or(SessionError::InvalidTransition {
                operation: "answer",
                phase: session.quiz.phase(),
            })?;

        let token = session.quiz.token();
        let reveal = Reveal {
            employee_id: question.employee_id(),
            chosen: choice,
            answer_index: question.answer_index(),
            correct: question.is_correct(choice),
            pending: session.timer.start(token),
        };
        session.pending = Some(PendingAnswer { token, choice });
        Ok(reveal)
    }

    /// Apply the answer whose reveal just ended.
    ///
    /// Cancelled reveals and reveals from a session that has been reset since
    /// are discarded without touching the state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Score` if the session finished but the score could
    /// not be saved. The session stays finished; call `finalize_score` to retry.
    pub async fn complete(
        &self,
        session: &mut ActiveSession,
        outcome: RevealOutcome,
    ) -> Result<AdvanceOutcome, SessionError> {
        let RevealOutcome::Fired(token) = outcome else {
            session.pending = None;
            return Ok(AdvanceOutcome::Discarded);
        };
        // `reset` clears `pending`, so a token mismatch means a stale reveal.
        let Some(pending) = session.pending.filter(|p| p.token == token) else {
            tracing::debug!(%token, "stale reveal discarded");
            return Ok(AdvanceOutcome::Discarded);
        };

        session.pending = None;
        let outcome = session.quiz.answer(pending.choice)?;
        let result = self.after_answer(session, outcome).await?;
        Ok(AdvanceOutcome::Advanced(result))
    }

    /// Skip the current question. Takes effect immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::RevealPending` while an answer is being revealed,
    /// `SessionError::InvalidTransition` unless the session is in progress and
    /// `SessionError::Score` if the final score could not be saved.
    pub async fn skip(&self, session: &mut ActiveSession) -> Result<AnswerResult, SessionError> {
        if session.pending.is_some() {
            return Err(SessionError::RevealPending);
        }
        let outcome = session.quiz.skip()?;
        self.after_answer(session, outcome).await
    }

    /// Retry saving the score of a finished session.
    ///
    /// Returns `Ok(None)` when there is nothing left to save.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Score` if the save fails again.
    pub async fn finalize_score(
        &self,
        session: &mut ActiveSession,
    ) -> Result<Option<Scoreboard>, SessionError> {
        let Some(finalized) = session.unsaved else {
            return Ok(None);
        };
        let board = self
            .scores
            .record(finalized.score, session.context.description())
            .await?;
        session.unsaved = None;
        Ok(Some(board))
    }

    /// Abandon the session: cancel any reveal and go back to idle.
    pub fn reset(&self, session: &mut ActiveSession) {
        session.timer.cancel();
        session.pending = None;
        if let Some(lost) = session.unsaved.take() {
            tracing::warn!(token = %lost.token, score = lost.score, "unsaved score dropped on reset");
        }
        session.quiz.reset();
    }

    async fn after_answer(
        &self,
        session: &mut ActiveSession,
        outcome: AnswerOutcome,
    ) -> Result<AnswerResult, SessionError> {
        let scoreboard = match outcome.finalized {
            Some(finalized) => {
                session.unsaved = Some(finalized);
                self.finalize_score(session).await?
            }
            None => None,
        };
        Ok(AnswerResult {
            outcome,
            scoreboard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quest_core::model::{CompanyId, DepartmentId, Employee, SessionPhase};
    use quest_core::time::fixed_clock;
    use storage::repository::{ScoreboardRepository, Storage, StorageError};
    use tokio::sync::Mutex;

    use crate::directory::InMemoryDirectory;

    const COMPANY: CompanyId = CompanyId::new(1);
    const DEPARTMENT: DepartmentId = DepartmentId::new(10);

    fn employee(id: u64) -> Employee {
        Employee::new(
            EmployeeId::new(id),
            format!("Employee {id}"),
            "",
            "Ops",
            DEPARTMENT,
            COMPANY,
            format!("https://photos.test/{id}.png"),
        )
        .unwrap()
    }

    fn directory(n: u64) -> Arc<InMemoryDirectory> {
        Arc::new(
            InMemoryDirectory::new()
                .with_company(COMPANY, "Acme")
                .with_department(DEPARTMENT, "Ops", None)
                .with_employees((1..=n).map(employee)),
        )
    }

    fn service_with(
        n: u64,
        repo: Arc<dyn ScoreboardRepository>,
    ) -> SessionLoopService {
        let scores = Arc::new(ScoreService::new(fixed_clock(), repo));
        SessionLoopService::new(directory(n), scores)
            .with_reveal_delay(Duration::from_millis(1500))
            .with_seed(Some(7))
    }

    fn service(n: u64) -> SessionLoopService {
        service_with(n, Storage::in_memory().scoreboard)
    }

    fn context() -> SessionContext {
        SessionContext::new(COMPANY, DEPARTMENT)
    }

    async fn answer_correctly(
        svc: &SessionLoopService,
        session: &mut ActiveSession,
    ) -> AdvanceOutcome {
        let idx = session.quiz().current_question().unwrap().answer_index();
        let reveal = svc.submit(session, idx).unwrap();
        assert!(reveal.correct);
        let outcome = reveal.pending.wait().await;
        svc.complete(session, outcome).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn full_session_records_score_once() {
        let svc = service(4);
        let mut session = svc.start_session(context()).await.unwrap();

        let mut boards = Vec::new();
        while !session.quiz().is_finished() {
            match answer_correctly(&svc, &mut session).await {
                AdvanceOutcome::Advanced(result) => boards.extend(result.scoreboard),
                AdvanceOutcome::Discarded => panic!("reveal discarded"),
            }
        }

        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].num_scores(), 1);
        assert_eq!(boards[0].scores()[0].score, 4);
        assert!(session.unsaved_score().is_none());
        assert_eq!(svc.scores().read().await.unwrap().num_scores(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn answer_is_applied_only_after_reveal() {
        let svc = service(3);
        let mut session = svc.start_session(context()).await.unwrap();

        let idx = session.quiz().current_question().unwrap().answer_index();
        let reveal = svc.submit(&mut session, idx).unwrap();
        assert!(session.is_revealing());
        assert_eq!(session.quiz().score(), 0);
        assert_eq!(session.quiz().progress().answered, 0);

        assert!(matches!(svc.submit(&mut session, 0), Err(SessionError::RevealPending)));
        assert!(matches!(svc.skip(&mut session).await, Err(SessionError::RevealPending)));

        let outcome = reveal.pending.wait().await;
        svc.complete(&mut session, outcome).await.unwrap();
        assert_eq!(session.quiz().score(), 1);
        assert_eq!(session.quiz().progress().answered, 1);
        assert!(!session.is_revealing());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_during_reveal_discards_the_answer() {
        let svc = service(3);
        let mut session = svc.start_session(context()).await.unwrap();
        let stale_token = session.quiz().token();

        let idx = session.quiz().current_question().unwrap().answer_index();
        let reveal = svc.submit(&mut session, idx).unwrap();
        svc.reset(&mut session);

        assert_eq!(reveal.pending.wait().await, RevealOutcome::Cancelled);
        assert_eq!(session.quiz().phase(), SessionPhase::Idle);

        // a fired outcome carrying the old token is ignored too
        let outcome = svc
            .complete(&mut session, RevealOutcome::Fired(stale_token))
            .await
            .unwrap();
        assert_eq!(outcome, AdvanceOutcome::Discarded);
        assert_eq!(session.quiz().score(), 0);
        assert!(svc.scores().read().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn skips_finish_with_zero_and_record_it() {
        let svc = service(2);
        let mut session = svc.start_session(context()).await.unwrap();

        assert!(svc.skip(&mut session).await.unwrap().scoreboard.is_none());
        let last = svc.skip(&mut session).await.unwrap();
        let board = last.scoreboard.unwrap();
        assert_eq!(board.scores()[0].score, 0);
        assert_eq!(board.scores()[0].description, context().description());
        assert!(session.quiz().is_finished());
    }

    #[tokio::test]
    async fn empty_department_finishes_without_recording() {
        let svc = service(0);
        let session = svc.start_session(context()).await.unwrap();
        assert!(session.quiz().is_finished());
        assert_eq!(session.quiz().score(), 0);
        assert!(svc.scores().read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn roster_is_capped_by_sampler() {
        let svc = service(20).with_sampler(SessionSampler::new(5).unwrap());
        let session = svc.start_session(context()).await.unwrap();
        assert_eq!(session.quiz().roster().len(), 5);
    }

    /// Fails the first `failures` saves, then behaves.
    struct FlakyRepo {
        inner: Arc<dyn ScoreboardRepository>,
        failures: Mutex<u32>,
    }

    #[async_trait]
    impl ScoreboardRepository for FlakyRepo {
        async fn load(&self) -> Result<Scoreboard, StorageError> {
            self.inner.load().await
        }

        async fn save(&self, board: &Scoreboard) -> Result<(), StorageError> {
            let mut failures = self.failures.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(StorageError::Connection("busy".into()));
            }
            self.inner.save(board).await
        }

        async fn clear(&self) -> Result<(), StorageError> {
            self.inner.clear().await
        }
    }

    #[tokio::test]
    async fn failed_save_can_be_retried() {
        let repo = Arc::new(FlakyRepo {
            inner: Storage::in_memory().scoreboard,
            failures: Mutex::new(1),
        });
        let svc = service_with(1, repo);
        let mut session = svc.start_session(context()).await.unwrap();

        assert!(matches!(svc.skip(&mut session).await, Err(SessionError::Score(_))));
        assert!(session.quiz().is_finished());
        assert_eq!(session.unsaved_score().map(|f| f.score), Some(0));

        let board = svc.finalize_score(&mut session).await.unwrap().unwrap();
        assert_eq!(board.num_scores(), 1);
        assert!(session.unsaved_score().is_none());
        assert!(svc.finalize_score(&mut session).await.unwrap().is_none());
    }
}
