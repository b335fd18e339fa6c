use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use quest_core::model::{ScoreRecord, Scoreboard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key under which the scoreboard document is persisted.
pub const SCOREBOARD_KEY: &str = "scoreBoard";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── KEY-VALUE STORE ───────────────────────────────────────────────────────────
//

/// Raw persistence primitive. Values are JSON text.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A missing key is
    /// `Ok(None)`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

//
// ─── SCOREBOARD DOCUMENT ───────────────────────────────────────────────────────
//

/// Persisted shape of a single score entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecordDocument {
    pub score: u32,
    pub date: String,
    pub description: String,
}

impl ScoreRecordDocument {
    #[must_use]
    pub fn from_record(record: &ScoreRecord) -> Self {
        Self {
            score: record.score,
            date: record.date.to_rfc3339_opts(SecondsFormat::Millis, true),
            description: record.description.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if `date` is not RFC 3339.
    pub fn into_record(self) -> Result<ScoreRecord, StorageError> {
        let date = DateTime::parse_from_rfc3339(&self.date)
            .map_err(|err| StorageError::Serialization(format!("invalid date {}: {err}", self.date)))?
            .with_timezone(&Utc);
        Ok(ScoreRecord::new(self.score, date, self.description))
    }
}

/// Persisted shape of the scoreboard:
/// `{ scores: [...], average: number, num_scores: int }`.
///
/// `average` and `num_scores` are written for readers of the raw document; on
/// load they are recomputed from `scores`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreboardDocument {
    #[serde(default)]
    pub scores: Vec<ScoreRecordDocument>,
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub num_scores: usize,
}

impl ScoreboardDocument {
    #[must_use]
    pub fn from_scoreboard(board: &Scoreboard) -> Self {
        Self {
            scores: board
                .scores()
                .iter()
                .map(ScoreRecordDocument::from_record)
                .collect(),
            average: board.average(),
            num_scores: board.num_scores(),
        }
    }

    /// Convert back into a domain `Scoreboard`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any record is malformed.
    pub fn into_scoreboard(self) -> Result<Scoreboard, StorageError> {
        let stored_average = self.average;
        let stored_count = self.num_scores;
        let records = self
            .scores
            .into_iter()
            .map(ScoreRecordDocument::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        let board = Scoreboard::from_records(records);

        if board.num_scores() != stored_count
            || (board.average() - stored_average).abs() > 0.005
        {
            tracing::warn!(
                stored_count,
                stored_average,
                count = board.num_scores(),
                average = board.average(),
                "persisted scoreboard totals were stale; recomputed from scores"
            );
        }
        Ok(board)
    }
}

//
// ─── SCOREBOARD REPOSITORY ─────────────────────────────────────────────────────
//

/// Repository contract for the cross-session scoreboard.
#[async_trait]
pub trait ScoreboardRepository: Send + Sync {
    /// Load the scoreboard, or the empty default if none was ever saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn load(&self) -> Result<Scoreboard, StorageError>;

    /// Replace the persisted scoreboard.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the scoreboard cannot be stored.
    async fn save(&self, board: &Scoreboard) -> Result<(), StorageError>;

    /// Delete the persisted scoreboard.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// `ScoreboardRepository` backed by any key-value store, under `SCOREBOARD_KEY`.
#[derive(Clone)]
pub struct KvScoreboardRepository {
    kv: Arc<dyn KeyValueStore>,
}

impl KvScoreboardRepository {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl ScoreboardRepository for KvScoreboardRepository {
    async fn load(&self) -> Result<Scoreboard, StorageError> {
        let Some(raw) = self.kv.get(SCOREBOARD_KEY).await? else {
            return Ok(Scoreboard::empty());
        };
        let doc: ScoreboardDocument = serde_json::from_str(&raw)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        doc.into_scoreboard()
    }

    async fn save(&self, board: &Scoreboard) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&ScoreboardDocument::from_scoreboard(board))
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(SCOREBOARD_KEY, &raw).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(SCOREBOARD_KEY).await
    }
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

/// Simple in-memory key-value store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Bundles the store and the scoreboard repository behind trait objects for
/// easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
    pub scoreboard: Arc<dyn ScoreboardRepository>,
}

impl Storage {
    #[must_use]
    pub fn from_kv(kv: Arc<dyn KeyValueStore>) -> Self {
        let scoreboard: Arc<dyn ScoreboardRepository> =
            Arc::new(KvScoreboardRepository::new(Arc::clone(&kv)));
        Self { kv, scoreboard }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_kv(Arc::new(InMemoryRepository::new()))
    }
}
