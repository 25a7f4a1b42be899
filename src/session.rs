//! Generation session lifecycle.
//!
//! A session is the backend job that turns a chosen story idea into a chapter
//! with panels. The client keeps no persistent state for it: the handle and the
//! observed [`GenerationSession`] live as long as the observing view, and a
//! session can always be re-entered by chapter id.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::ComicBackend;
use crate::error::ComicError;
use crate::models::{sort_by_index, Artifact, Chapter};
use crate::types::{ChapterId, ClassroomId, IdeaId, SessionStatus};

/// Observed state of one chapter generation attempt.
///
/// Only the status poller mutates it, through [`GenerationSession::apply_snapshot`]
/// and the terminal markers.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    pub session_id: ChapterId,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub artifacts: Vec<Artifact>,
    pub title: Option<String>,
    pub chapter_index: i64,
}

impl GenerationSession {
    pub fn new(session_id: ChapterId, created_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            created_at,
            status: SessionStatus::Pending,
            artifacts: Vec::new(),
            title: None,
            chapter_index: 0,
        }
    }

    /// Merge a fetched chapter into the session. Artifacts are keyed by
    /// sequence index, so a re-fetched panel replaces the earlier copy.
    pub fn apply_snapshot(&mut self, chapter: &Chapter) -> SessionStatus {
        for panel in &chapter.panels {
            match self
                .artifacts
                .iter_mut()
                .find(|existing| existing.index == panel.index)
            {
                Some(existing) => *existing = panel.clone(),
                None => self.artifacts.push(panel.clone()),
            }
        }
        sort_by_index(&mut self.artifacts);
        if let Some(title) = chapter.title() {
            self.title = Some(title);
        }
        if chapter.index != 0 {
            self.chapter_index = chapter.index;
        }
        self.status = chapter.session_status();
        self.status
    }

    pub fn mark_timed_out(&mut self) {
        self.status = SessionStatus::TimedOut;
    }

    pub fn mark_failed(&mut self) {
        self.status = SessionStatus::Failed;
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }
}

/// Tracks which chapters this client is currently observing.
///
/// At most one observer per chapter: a second claim fails with
/// [`ComicError::AlreadyObserved`] until the first slot is dropped.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    observed: Arc<Mutex<HashSet<ChapterId>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self, chapter: &ChapterId) -> Result<RegistrySlot, ComicError> {
        let mut observed = self.observed.lock();
        if !observed.insert(chapter.clone()) {
            return Err(ComicError::AlreadyObserved(chapter.to_string()));
        }
        Ok(RegistrySlot {
            chapter: chapter.clone(),
            observed: Arc::clone(&self.observed),
        })
    }

    pub fn is_observed(&self, chapter: &ChapterId) -> bool {
        self.observed.lock().contains(chapter)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.lock().len()
    }
}

/// Registry claim released on drop.
#[derive(Debug)]
pub struct RegistrySlot {
    chapter: ChapterId,
    observed: Arc<Mutex<HashSet<ChapterId>>>,
}

impl Drop for RegistrySlot {
    fn drop(&mut self) {
        self.observed.lock().remove(&self.chapter);
    }
}

/// Exclusive handle on a session. Not `Clone`: the poller takes ownership.
#[derive(Debug)]
pub struct SessionHandle {
    chapter: ChapterId,
    classroom: Option<ClassroomId>,
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    _slot: RegistrySlot,
}

impl SessionHandle {
    /// Re-enter an existing chapter by id without starting generation again.
    pub fn resume(registry: &SessionRegistry, chapter: ChapterId) -> Result<Self, ComicError> {
        let slot = registry.claim(&chapter)?;
        debug!(chapter = %chapter, "Resuming observation");
        Ok(Self {
            chapter,
            classroom: None,
            started_at: Utc::now(),
            cancel: CancellationToken::new(),
            _slot: slot,
        })
    }

    pub fn chapter_id(&self) -> &ChapterId {
        &self.chapter
    }

    pub fn classroom_id(&self) -> Option<&ClassroomId> {
        self.classroom.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Cloneable soft-cancel switch for this session's observer.
    pub fn canceller(&self) -> SessionCanceller {
        SessionCanceller {
            token: self.cancel.clone(),
        }
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn new_session(&self) -> GenerationSession {
        GenerationSession::new(self.chapter.clone(), self.started_at)
    }
}

/// Stops local observation of a session.
///
/// This is a soft cancel: the backend job is not told anything and keeps
/// producing panels. Re-enter with [`SessionHandle::resume`] to observe again.
#[derive(Debug, Clone)]
pub struct SessionCanceller {
    token: CancellationToken,
}

impl SessionCanceller {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Soft-cancel a session observer. See [`SessionCanceller`].
pub fn cancel(handle: &SessionHandle) {
    handle.canceller().cancel();
}

/// Begin generation of `chapter` (a draft created by idea generation) with the
/// chosen idea, and return the handle to observe it.
///
/// The idea must be one the draft's outline offers. A draft that lists no
/// ideas is committed unchecked.
pub async fn start_session(
    backend: &dyn ComicBackend,
    registry: &SessionRegistry,
    classroom: &ClassroomId,
    chapter: &ChapterId,
    idea: &IdeaId,
) -> Result<SessionHandle, ComicError> {
    if idea.as_str().trim().is_empty() {
        return Err(ComicError::InvalidChoice("Idea identifier is empty".to_string()));
    }
    let slot = registry.claim(chapter)?;
    let draft = backend.get_chapter(chapter).await?;
    match draft.offered_ideas() {
        Some(offered) if !offered.contains(idea) => {
            return Err(ComicError::InvalidChoice(format!(
                "Idea {} is not one of the ideas offered for chapter {}",
                idea, chapter
            )));
        }
        Some(_) => {}
        None => debug!(chapter = %chapter, "Draft lists no ideas; committing unchecked"),
    }
    let ack = backend.commit_chapter(chapter, idea).await?;
    if &ack.chapter_id != chapter {
        debug!(
            requested = %chapter,
            returned = %ack.chapter_id,
            "Backend returned a different chapter id"
        );
    }
    info!(
        chapter = %chapter,
        classroom = %classroom,
        idea = %idea,
        status = ack.status.as_deref().unwrap_or("unknown"),
        "Chapter generation started"
    );
    Ok(SessionHandle {
        chapter: chapter.clone(),
        classroom: Some(classroom.clone()),
        started_at: Utc::now(),
        cancel: CancellationToken::new(),
        _slot: slot,
    })
}
