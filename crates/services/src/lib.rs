#![forbid(unsafe_code)]

pub mod app_services;
pub mod directory;
pub mod error;
pub mod score_service;
pub mod sessions;

pub use quest_core::Clock;
pub use sessions as session;

pub use app_services::{AppServices, DirectorySource, SessionSettings};
pub use directory::{DirectoryProvider, InMemoryDirectory, OdooConfig, OdooDirectory};
pub use error::{AppServicesError, DirectoryError, ScoreServiceError, SessionError};
pub use score_service::ScoreService;

pub use sessions::{
    ActiveSession, AdvanceOutcome, AnswerOutcome, AnswerResult, QuestionGenerator, QuizSession,
    Reveal, RevealOutcome, SessionLoopService, SessionProgress, SessionSampler,
};
