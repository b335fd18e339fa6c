use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CompanyId, DepartmentId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("score {score} exceeds the {total} questions asked")]
    ScoreAboveTotal { score: u32, total: u32 },
}

//
// ─── SESSION CONTEXT ───────────────────────────────────────────────────────────
//

/// Company and department a session was played against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionContext {
    pub company: CompanyId,
    pub department: DepartmentId,
}

impl SessionContext {
    #[must_use]
    pub fn new(company: CompanyId, department: DepartmentId) -> Self {
        Self {
            company,
            department,
        }
    }

    /// Opaque description stored alongside each score.
    #[must_use]
    pub fn description(&self) -> String {
        serde_json::json!({
            "company": self.company.value(),
            "department": self.department.value(),
        })
        .to_string()
    }
}

//
// ─── SCORE RECORD ──────────────────────────────────────────────────────────────
//

/// Final score of one finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub score: u32,
    pub date: DateTime<Utc>,
    pub description: String,
}

impl ScoreRecord {
    #[must_use]
    pub fn new(score: u32, date: DateTime<Utc>, description: impl Into<String>) -> Self {
        Self {
            score,
            date,
            description: description.into(),
        }
    }
}

//
// ─── SCOREBOARD ────────────────────────────────────────────────────────────────
//

/// Every recorded session score plus the derived count and rolling average.
///
/// `num_scores` and `average` are never set directly; they are recomputed from
/// `scores` on construction and on every append.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scoreboard {
    scores: Vec<ScoreRecord>,
    average: f64,
    num_scores: usize,
}

impl Scoreboard {
    /// The empty scoreboard: no scores, average 0.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records(scores: Vec<ScoreRecord>) -> Self {
        let mut board = Self {
            scores,
            average: 0.0,
            num_scores: 0,
        };
        board.recompute();
        board
    }

    /// Append a record and refresh the derived fields.
    pub fn push(&mut self, record: ScoreRecord) {
        self.scores.push(record);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.num_scores = self.scores.len();
        self.average = average_of(&self.scores);
    }

    #[must_use]
    pub fn scores(&self) -> &[ScoreRecord] {
        &self.scores
    }

    /// Mean of all scores rounded to 2 decimal places.
    #[must_use]
    pub fn average(&self) -> f64 {
        self.average
    }

    #[must_use]
    pub fn num_scores(&self) -> usize {
        self.num_scores
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&ScoreRecord> {
        self.scores.last()
    }
}

/// Mean of the record scores rounded to 2 decimals; `0.0` when empty.
#[must_use]
pub fn average_of(scores: &[ScoreRecord]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let total: u64 = scores.iter().map(|r| u64::from(r.score)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = total as f64 / scores.len() as f64;
    round2(mean)
}

/// Round half away from zero to 2 decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//
// ─── SCORE BAND ────────────────────────────────────────────────────────────────
//

/// Coarse rating of a finished session, used for end-of-game feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Zero,
    Low,
    High,
    Perfect,
}

impl ScoreBand {
    /// Classify `score` out of `total`.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::ScoreAboveTotal` when `score > total`.
    pub fn classify(score: u32, total: u32) -> Result<Self, ScoreError> {
        if score > total {
            return Err(ScoreError::ScoreAboveTotal { score, total });
        }
        // An empty session reports Zero rather than Perfect.
        if score == 0 {
            return Ok(Self::Zero);
        }
        if score == total {
            return Ok(Self::Perfect);
        }
        if u64::from(score) * 2 < u64::from(total) {
            Ok(Self::Low)
        } else {
            Ok(Self::High)
        }
    }
}
