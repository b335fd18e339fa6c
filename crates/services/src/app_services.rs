use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use quest_core::model::TemplateSet;
use storage::repository::Storage;

use crate::Clock;
use crate::directory::{DirectoryProvider, InMemoryDirectory, OdooConfig, OdooDirectory};
use crate::error::AppServicesError;
use crate::score_service::ScoreService;
use crate::sessions::{
    DEFAULT_REVEAL_DELAY, DEFAULT_SESSION_SIZE, QuestionGenerator, SessionLoopService,
    SessionSampler,
};

/// Where employees come from.
#[derive(Debug, Clone)]
pub enum DirectorySource {
    Odoo(OdooConfig),
    RosterFile(PathBuf),
}

/// Knobs for every session played through `AppServices`.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub session_size: usize,
    pub reveal_delay: Duration,
    pub templates: TemplateSet,
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_size: DEFAULT_SESSION_SIZE,
            reveal_delay: DEFAULT_REVEAL_DELAY,
            templates: TemplateSet::default(),
            seed: None,
        }
    }
}

/// Assembles the app-facing services over one storage backend and one directory.
#[derive(Clone)]
pub struct AppServices {
    directory: Arc<dyn DirectoryProvider>,
    scores: Arc<ScoreService>,
    session_loop: Arc<SessionLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails, the roster
    /// file cannot be loaded, or the session size is 0.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        source: DirectorySource,
        settings: SessionSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(storage, clock, source, settings)
    }

    /// Build services over an already opened storage bundle.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the roster file cannot be loaded or the
    /// session size is 0.
    pub fn from_storage(
        storage: Storage,
        clock: Clock,
        source: DirectorySource,
        settings: SessionSettings,
    ) -> Result<Self, AppServicesError> {
        let directory: Arc<dyn DirectoryProvider> = match source {
            DirectorySource::Odoo(config) => {
                tracing::info!(base_url = %config.base_url, "using odoo directory");
                Arc::new(OdooDirectory::new(config))
            }
            DirectorySource::RosterFile(path) => {
                tracing::info!(path = %path.display(), "using roster file");
                Arc::new(InMemoryDirectory::from_file(&path)?)
            }
        };

        let scores = Arc::new(ScoreService::new(clock, Arc::clone(&storage.scoreboard)));
        let session_loop = Arc::new(
            SessionLoopService::new(Arc::clone(&directory), Arc::clone(&scores))
                .with_sampler(SessionSampler::new(settings.session_size)?)
                .with_generator(QuestionGenerator::new(settings.templates))
                .with_reveal_delay(settings.reveal_delay)
                .with_seed(settings.seed),
        );

        Ok(Self {
            directory,
            scores,
            session_loop,
        })
    }

    #[must_use]
    pub fn directory(&self) -> Arc<dyn DirectoryProvider> {
        Arc::clone(&self.directory)
    }

    #[must_use]
    pub fn scores(&self) -> Arc<ScoreService> {
        Arc::clone(&self.scores)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }
}
