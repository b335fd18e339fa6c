use rand::rngs::StdRng;
use std::fmt;

use quest_core::model::{
    Employee, EmployeeId, Question, SessionPhase, SessionState, SessionToken,
};

use super::progress::SessionProgress;
use super::questions::QuestionGenerator;
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Emitted exactly once per session, on the transition into `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalized {
    pub token: SessionToken,
    pub score: u32,
    pub total: u32,
}

/// What happened when the current question was answered or skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub employee_id: EmployeeId,
    /// `None` when the question was skipped.
    pub chosen: Option<usize>,
    pub answer_index: usize,
    pub correct: bool,
    pub state: SessionState,
    pub finalized: Option<Finalized>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// State machine for one quiz session: `Idle -> InProgress -> Finished`.
///
/// Owns the roster for the session's lifetime and the question for the current
/// position. Only `reset` leaves `Finished`.
pub struct QuizSession {
    generator: QuestionGenerator,
    rng: StdRng,
    token: SessionToken,
    roster: Vec<Employee>,
    question: Option<Question>,
    state: SessionState,
}

impl QuizSession {
    #[must_use]
    pub fn new(generator: QuestionGenerator, rng: StdRng) -> Self {
        Self {
            generator,
            rng,
            token: SessionToken::default(),
            roster: Vec::new(),
            question: None,
            state: SessionState::default(),
        }
    }

    #[must_use]
    pub fn token(&self) -> SessionToken {
        self.token
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.state.score
    }

    /// The roster of the loaded session. Still readable once finished.
    #[must_use]
    pub fn roster(&self) -> &[Employee] {
        &self.roster
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        u32::try_from(self.roster.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    #[must_use]
    pub fn current_employee(&self) -> Option<&Employee> {
        if self.state.phase != SessionPhase::InProgress {
            return None;
        }
        self.roster.get(self.state.position)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.phase == SessionPhase::Finished
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.roster.len(),
            answered: self.state.position,
            remaining: self.roster.len().saturating_sub(self.state.position),
            score: self.state.score,
            is_complete: self.is_finished(),
        }
    }

    /// Load a roster and ask the first question.
    ///
    /// An empty roster finishes the session on the spot with score 0. Nothing was
    /// asked, so no `Finalized` signal is produced for it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is idle.
    pub fn start(&mut self, roster: Vec<Employee>) -> Result<(), SessionError> {
        self.require(SessionPhase::Idle, "start")?;

        let first = if roster.is_empty() {
            None
        } else {
            Some(self.generator.generate(&roster, 0, &mut self.rng)?)
        };

        self.token = self.token.next();
        self.roster = roster;
        self.state = SessionState {
            position: 0,
            score: 0,
            phase: SessionPhase::InProgress,
        };
        self.question = first;

        if self.roster.is_empty() {
            self.state.phase = SessionPhase::Finished;
            tracing::info!(token = %self.token, "empty roster; session finished immediately");
            return Ok(());
        }

        tracing::info!(token = %self.token, total = self.roster.len(), "session started");
        Ok(())
    }

    /// Answer the current question with the choice at `choice_index`.
    ///
    /// An index outside the offered choices counts as a wrong answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is in progress.
    pub fn answer(&mut self, choice_index: usize) -> Result<AnswerOutcome, SessionError> {
        self.advance(Some(choice_index), "answer")
    }

    /// Skip the current question. Never scores.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is in progress.
    pub fn skip(&mut self) -> Result<AnswerOutcome, SessionError> {
        self.advance(None, "skip")
    }

    /// Drop the roster and go back to `Idle`. Valid from any phase.
    pub fn reset(&mut self) {
        self.token = self.token.next();
        self.roster.clear();
        self.question = None;
        self.state = SessionState::default();
        tracing::debug!(token = %self.token, "session reset");
    }

    fn advance(
        &mut self,
        chosen: Option<usize>,
        operation: &'static str,
    ) -> Result<AnswerOutcome, SessionError> {
        self.require(SessionPhase::InProgress, operation)?;
        let question = self
            .question
            .as_ref()
            .ok_or(SessionError::InvalidTransition {
                operation,
                phase: self.state.phase,
            })?;

        let correct = chosen.is_some_and(|idx| question.is_correct(idx));
        let employee_id = question.employee_id();
        let answer_index = question.answer_index();

        let next_position = self.state.position + 1;
        // Build the next question before touching state so a failure leaves the
        // session where it was.
        let next_question = if next_position < self.roster.len() {
            Some(
                self.generator
                    .generate(&self.roster, next_position, &mut self.rng)?,
            )
        } else {
            None
        };

        if correct {
            self.state.score += 1;
        }
        self.state.position = next_position;
        self.question = next_question;

        let finalized = if self.question.is_none() {
            self.state.phase = SessionPhase::Finished;
            tracing::info!(
                token = %self.token,
                score = self.state.score,
                total = self.roster.len(),
                "session finished"
            );
            Some(self.finalized())
        } else {
            None
        };

        tracing::debug!(
            token = %self.token,
            position = self.state.position,
            score = self.state.score,
            correct,
            skipped = chosen.is_none(),
            "question answered"
        );

        Ok(AnswerOutcome {
            employee_id,
            chosen,
            answer_index,
            correct,
            state: self.state,
            finalized,
        })
    }

    fn finalized(&self) -> Finalized {
        Finalized {
            token: self.token,
            score: self.state.score,
            total: self.total(),
        }
    }

    fn require(&self, phase: SessionPhase, operation: &'static str) -> Result<(), SessionError> {
        if self.state.phase == phase {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                operation,
                phase: self.state.phase,
            })
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("token", &self.token)
            .field("roster_len", &self.roster.len())
            .field("state", &self.state)
            .field("has_question", &self.question.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
