//! Shared test utilities for integration tests
//!
//! An in-memory backend with scripted chapter snapshots, image payload
//! builders, and a lock serializing tests that touch `EDUCOMIC*` variables.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use educomic::models::{CommitAck, IdeaBatch};
use educomic::{
    Chapter, ChapterId, ChapterSummary, ClassroomId, ComicBackend, ComicError, IdeaId, Panel,
    StoryIdea,
};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with the given environment variables set, restoring them afterwards.
pub fn with_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let previous: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        std::env::set_var(key, value);
    }

    let result = f();

    for (key, value) in previous {
        match value {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    result
}

/// PNG of a solid colour, as a `data:` URI.
pub fn png_data_uri(width: u32, height: u32) -> String {
    let buffer = ImageBuffer::from_pixel(width, height, Rgb([200u8, 40, 40]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png))
}

pub fn panel(index: i64, image: String) -> Panel {
    Panel {
        id: format!("panel-{index}"),
        chapter_id: Some(ChapterId::new("chapter-1")),
        index,
        image,
        created_at: None,
    }
}

/// Chapter snapshot with the given status column and panels.
pub fn chapter(id: &str, status: &str, panels: Vec<Panel>) -> Chapter {
    let mut chapter: Chapter = serde_json::from_value(json!({
        "id": id,
        "classroom_id": "class-1",
        "index": 3,
        "story_title": "The Water Cycle",
        "status": status,
    }))
    .unwrap();
    chapter.panels = panels;
    chapter
}

/// Draft chapter as idea generation leaves it: an outline offering `ideas`.
pub fn draft(id: &str, ideas: &[&str]) -> Chapter {
    let outline = json!({
        "status": "ideas_generated",
        "story_ideas": ideas
            .iter()
            .map(|idea| json!({"id": idea, "title": format!("Story {idea}")}))
            .collect::<Vec<_>>(),
    });
    let mut draft = chapter(id, "draft", vec![]);
    draft.chapter_outline = Some(outline.to_string());
    draft
}

/// In-memory backend. Until a commit succeeds `get_chapter` serves the draft,
/// if one is set. Otherwise it replays the script, then repeats the last
/// snapshot once the script is exhausted.
pub struct MockBackend {
    draft: Mutex<Option<Chapter>>,
    committed: AtomicBool,
    snapshots: Mutex<VecDeque<Result<Chapter, ComicError>>>,
    last: Mutex<Option<Chapter>>,
    commit_error: Mutex<Option<ComicError>>,
    chapters: Mutex<Vec<ChapterSummary>>,
    pub fetches: AtomicUsize,
    pub draft_fetches: AtomicUsize,
    pub commits: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl MockBackend {
    pub fn new(snapshots: Vec<Result<Chapter, ComicError>>) -> Self {
        Self {
            draft: Mutex::new(None),
            committed: AtomicBool::new(false),
            snapshots: Mutex::new(snapshots.into()),
            last: Mutex::new(None),
            commit_error: Mutex::new(None),
            chapters: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            draft_fetches: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn fail_commit_with(&self, error: ComicError) {
        *self.commit_error.lock() = Some(error);
    }

    /// Serve the draft of `chapter-1` offering `idea-1` to `idea-3`.
    pub fn with_draft(self) -> Self {
        *self.draft.lock() = Some(draft("chapter-1", &["idea-1", "idea-2", "idea-3"]));
        self
    }

    pub fn with_chapters(self, chapters: Vec<ChapterSummary>) -> Self {
        *self.chapters.lock() = chapters;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ComicBackend for MockBackend {
    async fn generate_ideas(
        &self,
        _classroom: &ClassroomId,
        teacher_outline: &str,
    ) -> Result<IdeaBatch, ComicError> {
        let ideas = (1..=3)
            .map(|n| StoryIdea {
                id: IdeaId::new(format!("idea-{n}")),
                title: format!("{} #{n}", teacher_outline),
                summary: String::new(),
                theme: None,
            })
            .collect();
        Ok(IdeaBatch {
            chapter_id: ChapterId::new("chapter-1"),
            ideas,
        })
    }

    async fn commit_chapter(
        &self,
        chapter: &ChapterId,
        _idea: &IdeaId,
    ) -> Result<CommitAck, ComicError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.commit_error.lock().take() {
            return Err(error);
        }
        self.committed.store(true, Ordering::SeqCst);
        Ok(CommitAck {
            chapter_id: chapter.clone(),
            status: Some("generating".to_string()),
            message: None,
        })
    }

    async fn get_chapter(&self, chapter: &ChapterId) -> Result<Chapter, ComicError> {
        if !self.committed.load(Ordering::SeqCst) {
            if let Some(draft) = self.draft.lock().clone() {
                self.draft_fetches.fetch_add(1, Ordering::SeqCst);
                return Ok(draft);
            }
        }
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.snapshots.lock().pop_front();
        match next {
            Some(Ok(snapshot)) => {
                *self.last.lock() = Some(snapshot.clone());
                Ok(snapshot)
            }
            Some(Err(error)) => Err(error),
            None => self
                .last
                .lock()
                .clone()
                .ok_or_else(|| ComicError::NotFound(format!("Chapter {}", chapter))),
        }
    }

    async fn list_chapters(
        &self,
        _classroom: &ClassroomId,
    ) -> Result<Vec<ChapterSummary>, ComicError> {
        Ok(self.chapters.lock().clone())
    }

    async fn delete_chapter(&self, _chapter: &ChapterId) -> Result<(), ComicError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn health(&self) -> Result<String, ComicError> {
        Ok("healthy".to_string())
    }
}
