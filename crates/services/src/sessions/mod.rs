mod progress;
mod questions;
mod reveal;
mod sampler;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use questions::QuestionGenerator;
pub use reveal::{
    DEFAULT_REVEAL_DELAY, PendingReveal, RevealCanceller, RevealOutcome, RevealTimer,
};
pub use sampler::{DEFAULT_SESSION_SIZE, SessionSampler};
pub use service::{AnswerOutcome, Finalized, QuizSession};
pub use workflow::{ActiveSession, AdvanceOutcome, AnswerResult, Reveal, SessionLoopService};
