use std::sync::Arc;

use quest_core::model::{ScoreRecord, Scoreboard};
use quest_core::time::Clock;
use storage::repository::ScoreboardRepository;

use crate::error::ScoreServiceError;

/// Keeps the cross-session scoreboard: every finished session's score plus the
/// rolling count and average.
#[derive(Clone)]
pub struct ScoreService {
    clock: Clock,
    repo: Arc<dyn ScoreboardRepository>,
}

impl ScoreService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn ScoreboardRepository>) -> Self {
        Self { clock, repo }
    }

    /// Append a finished session's score and persist the updated scoreboard.
    ///
    /// Callers must not interleave `record` calls; the load-append-save is not
    /// guarded against concurrent writers.
    ///
    /// # Errors
    ///
    /// Returns `ScoreServiceError::Storage` if the scoreboard cannot be loaded
    /// or saved. Nothing is retried.
    pub async fn record(
        &self,
        score: u32,
        description: impl Into<String>,
    ) -> Result<Scoreboard, ScoreServiceError> {
        let mut board = self.repo.load().await?;
        board.push(ScoreRecord::new(score, self.clock.now(), description));
        self.repo.save(&board).await?;

        tracing::info!(
            score,
            num_scores = board.num_scores(),
            average = board.average(),
            "score recorded"
        );
        Ok(board)
    }

    /// Current scoreboard; the empty one if nothing was recorded yet.
    ///
    /// # Errors
    ///
    /// Returns `ScoreServiceError::Storage` on backend failures.
    pub async fn read(&self) -> Result<Scoreboard, ScoreServiceError> {
        Ok(self.repo.load().await?)
    }

    /// Delete every recorded score.
    ///
    /// # Errors
    ///
    /// Returns `ScoreServiceError::Storage` on backend failures.
    pub async fn clear(&self) -> Result<(), ScoreServiceError> {
        self.repo.clear().await?;
        tracing::info!("scoreboard cleared");
        Ok(())
    }
}
