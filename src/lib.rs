//! EduComic: chapter generation tracking and comic export
//!
//! Starts and observes server-side generation of classroom comic chapters,
//! polling the backend until every panel exists, and lays finished panels out
//! into a paginated PDF.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod poller;
pub mod scheduler;
pub mod session;
pub mod types;

pub use backend::{ComicBackend, HttpBackend, HttpTimeouts};
pub use error::ComicError;
pub use export::{DocumentExporter, ExportSpec, ExportedDocument};
pub use models::{Artifact, Chapter, ChapterSummary, Panel, StoryIdea};
pub use poller::{PollOutcome, PollPolicy, PollProgress, PollReport, PollerGuard, StatusPoller};
pub use scheduler::{Scheduler, TokioScheduler};
pub use session::{cancel, start_session, GenerationSession, SessionHandle, SessionRegistry};
pub use types::{ChapterId, ClassroomId, IdeaId, SessionStatus};
