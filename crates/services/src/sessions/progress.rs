use quest_core::model::{ScoreBand, ScoreError};

/// Aggregated view of session progress for the shell's header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub score: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    /// End-of-game rating of the current score.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError` if the score exceeds the roster size.
    pub fn band(&self) -> Result<ScoreBand, ScoreError> {
        let total = u32::try_from(self.total).unwrap_or(u32::MAX);
        ScoreBand::classify(self.score, total)
    }
}
