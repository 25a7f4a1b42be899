//! Status poller for chapter generation.
//!
//! The backend offers no push channel, so progress is observed by fetching the
//! chapter on a fixed interval. Fetches are strictly sequential: the next tick
//! is only scheduled after the previous response has been processed. Progress
//! is published on a `watch` channel that any view can subscribe to, and the
//! run ends with exactly one [`PollOutcome`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::ComicBackend;
use crate::error::ComicError;
use crate::models::Artifact;
use crate::scheduler::Scheduler;
use crate::session::{GenerationSession, SessionCanceller, SessionHandle};
use crate::types::{ChapterId, SessionStatus};

/// Fixed polling policy: no backoff beyond the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 300;
    pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 10;
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            max_consecutive_errors: Self::DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

/// Per-run bookkeeping. Owned by a single poller.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    pub attempts: u32,
    pub consecutive_errors: u32,
    pub last_artifact_count: usize,
    pub elapsed: Duration,
}

/// Observable progress of a poll run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollProgress {
    pub chapter: ChapterId,
    pub status: SessionStatus,
    pub artifact_count: usize,
    pub attempts: u32,
    pub consecutive_errors: u32,
    pub elapsed_ms: u128,
    pub finished: bool,
}

impl PollProgress {
    fn initial(chapter: ChapterId) -> Self {
        Self {
            chapter,
            status: SessionStatus::Pending,
            artifact_count: 0,
            attempts: 0,
            consecutive_errors: 0,
            elapsed_ms: 0,
            finished: false,
        }
    }
}

/// Terminal result of a poll run. Exactly one is produced per run.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Generation finished; artifacts sorted by sequence index.
    Ready(Vec<Artifact>),
    /// The backend reported the job as failed.
    Failed { reason: String },
    /// Consecutive fetch failures reached the error budget.
    ConnectionLost { attempts: u32 },
    /// The attempt budget ran out before the chapter became ready.
    TimedOut { attempts: u32 },
    /// Observation was cancelled locally.
    Cancelled,
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready(_))
    }

    pub fn into_result(self) -> Result<Vec<Artifact>, ComicError> {
        match self {
            PollOutcome::Ready(artifacts) => Ok(artifacts),
            PollOutcome::Failed { reason } => Err(ComicError::GenerationFailed(reason)),
            PollOutcome::ConnectionLost { attempts } => {
                Err(ComicError::ConnectionLost { attempts })
            }
            PollOutcome::TimedOut { attempts } => Err(ComicError::GenerationTimedOut { attempts }),
            PollOutcome::Cancelled => Err(ComicError::Cancelled),
        }
    }
}

/// Outcome plus the session as last observed.
#[derive(Debug, Clone)]
pub struct PollReport {
    pub outcome: PollOutcome,
    pub session: GenerationSession,
    pub state: PollState,
}

/// Observes one generation session until it reaches a terminal outcome.
pub struct StatusPoller {
    handle: SessionHandle,
    backend: Arc<dyn ComicBackend>,
    scheduler: Arc<dyn Scheduler>,
    policy: PollPolicy,
    progress: watch::Sender<PollProgress>,
}

impl StatusPoller {
    pub fn new(
        handle: SessionHandle,
        backend: Arc<dyn ComicBackend>,
        scheduler: Arc<dyn Scheduler>,
        policy: PollPolicy,
    ) -> Self {
        let (progress, _) = watch::channel(PollProgress::initial(handle.chapter_id().clone()));
        Self {
            handle,
            backend,
            scheduler,
            policy,
            progress,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollProgress> {
        self.progress.subscribe()
    }

    pub fn canceller(&self) -> SessionCanceller {
        self.handle.canceller()
    }

    /// Run the poll loop to completion on the current task.
    pub async fn run(self) -> PollReport {
        let token = self.handle.cancel_token();
        let chapter = self.handle.chapter_id().clone();
        let mut session = self.handle.new_session();
        let mut state = PollState::default();

        debug!(chapter = %chapter, policy = ?self.policy, "Polling started");

        let outcome = loop {
            if token.is_cancelled() {
                break PollOutcome::Cancelled;
            }
            if state.attempts >= self.policy.max_attempts {
                session.mark_timed_out();
                break PollOutcome::TimedOut {
                    attempts: state.attempts,
                };
            }

            let slept = tokio::select! {
                biased;
                _ = token.cancelled() => false,
                _ = self.scheduler.sleep(self.policy.interval) => true,
            };
            if !slept || token.is_cancelled() {
                break PollOutcome::Cancelled;
            }
            state.elapsed += self.policy.interval;
            state.attempts += 1;

            let fetched = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                result = self.backend.get_chapter(&chapter) => Some(result),
            };
            let Some(fetched) = fetched else {
                break PollOutcome::Cancelled;
            };

            match fetched {
                Ok(snapshot) => {
                    state.consecutive_errors = 0;
                    let status = session.apply_snapshot(&snapshot);
                    state.last_artifact_count = session.artifact_count();
                    debug!(
                        chapter = %chapter,
                        attempt = state.attempts,
                        artifacts = state.last_artifact_count,
                        status = %status,
                        "Poll tick"
                    );
                    self.publish(&session, &state, false);
                    match status {
                        SessionStatus::Ready => break PollOutcome::Ready(session.artifacts.clone()),
                        SessionStatus::Failed => {
                            break PollOutcome::Failed {
                                reason: format!("Backend reported chapter {} as failed", chapter),
                            }
                        }
                        SessionStatus::Pending | SessionStatus::TimedOut => {}
                    }
                }
                Err(err) => {
                    state.consecutive_errors += 1;
                    warn!(
                        chapter = %chapter,
                        attempt = state.attempts,
                        consecutive_errors = state.consecutive_errors,
                        error = %err,
                        "Poll fetch failed"
                    );
                    self.publish(&session, &state, false);
                    if state.consecutive_errors >= self.policy.max_consecutive_errors {
                        break PollOutcome::ConnectionLost {
                            attempts: state.attempts,
                        };
                    }
                }
            }
        };

        if matches!(outcome, PollOutcome::Failed { .. }) {
            session.mark_failed();
        }
        self.publish(&session, &state, true);
        info!(
            chapter = %chapter,
            outcome = outcome_label(&outcome),
            attempts = state.attempts,
            artifacts = session.artifact_count(),
            "Polling finished"
        );

        PollReport {
            outcome,
            session,
            state,
        }
    }

    /// Run the poll loop on a tokio task. Dropping the guard cancels it.
    pub fn spawn(self) -> PollerGuard {
        let token = self.handle.cancel_token();
        let progress = self.subscribe();
        let task = tokio::spawn(self.run());
        PollerGuard {
            token,
            progress,
            task: Some(task),
        }
    }

    fn publish(&self, session: &GenerationSession, state: &PollState, finished: bool) {
        self.progress.send_replace(PollProgress {
            chapter: session.session_id.clone(),
            status: session.status,
            artifact_count: session.artifact_count(),
            attempts: state.attempts,
            consecutive_errors: state.consecutive_errors,
            elapsed_ms: state.elapsed.as_millis(),
            finished,
        });
    }
}

fn outcome_label(outcome: &PollOutcome) -> &'static str {
    match outcome {
        PollOutcome::Ready(_) => "ready",
        PollOutcome::Failed { .. } => "failed",
        PollOutcome::ConnectionLost { .. } => "connection_lost",
        PollOutcome::TimedOut { .. } => "timed_out",
        PollOutcome::Cancelled => "cancelled",
    }
}

/// Owns a spawned poll run. Tearing down the owning view drops the guard,
/// which cancels the run before any further tick fires.
pub struct PollerGuard {
    token: CancellationToken,
    progress: watch::Receiver<PollProgress>,
    task: Option<JoinHandle<PollReport>>,
}

impl PollerGuard {
    pub fn progress(&self) -> watch::Receiver<PollProgress> {
        self.progress.clone()
    }

    /// Soft cancel; the backend job keeps running.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the run's terminal report. Dropping this future before it
    /// resolves tears the run down like dropping the guard.
    pub async fn wait(mut self) -> Result<PollReport, ComicError> {
        let Some(task) = self.task.as_mut() else {
            return Err(ComicError::Cancelled);
        };
        let result = task.await;
        self.task = None;
        result.map_err(|e| ComicError::GenerationFailed(format!("Poller task failed: {}", e)))
    }
}

impl Drop for PollerGuard {
    fn drop(&mut self) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            self.token.cancel();
        }
    }
}
