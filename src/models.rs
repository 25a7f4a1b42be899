//! Backend wire models: chapters, panels, story ideas.
//!
//! Field names follow the backend's JSON so responses deserialize directly.
//! Unknown fields are ignored.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{ChapterId, ClassroomId, IdeaId, SessionStatus};

/// One generated image of a chapter. The sequence `index` is the sort key
/// for display and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    #[serde(default)]
    pub chapter_id: Option<ChapterId>,
    pub index: i64,
    /// Image reference: an http(s) URL, a `data:` URI, or a local path.
    pub image: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Artifacts produced by a generation session are the chapter's panels.
pub type Artifact = Panel;

/// Sort panels by sequence index, ascending.
pub fn sort_by_index(panels: &mut [Panel]) {
    panels.sort_by_key(|panel| panel.index);
}

/// A chapter as returned by `GET /chapters/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    #[serde(default)]
    pub classroom_id: Option<ClassroomId>,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub story_title: Option<String>,
    #[serde(default)]
    pub chapter_outline: Option<String>,
    #[serde(default)]
    pub original_prompt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub panels: Vec<Panel>,
}

impl Chapter {
    /// Effective generation status.
    ///
    /// A terminal value in the `status` column wins. Otherwise a JSON outline
    /// carrying `"status"` decides, since the backend records completion there.
    pub fn session_status(&self) -> SessionStatus {
        let column = self
            .status
            .as_deref()
            .map(SessionStatus::from_remote)
            .unwrap_or(SessionStatus::Pending);
        if column.is_terminal() {
            return column;
        }
        self.outline_json()
            .and_then(|outline| {
                outline
                    .get("status")
                    .and_then(Value::as_str)
                    .map(SessionStatus::from_remote)
            })
            .unwrap_or(column)
    }

    /// Title for display and file naming: explicit `story_title`, else the
    /// chosen idea's title recorded in the outline.
    pub fn title(&self) -> Option<String> {
        if let Some(title) = self.story_title.as_deref() {
            if !title.trim().is_empty() {
                return Some(title.trim().to_string());
            }
        }
        let outline = self.outline_json()?;
        let chosen = outline.get("chosen_idea_id").and_then(Value::as_str)?;
        outline
            .get("story_ideas")
            .and_then(Value::as_array)?
            .iter()
            .find(|idea| idea.get("id").and_then(Value::as_str) == Some(chosen))
            .and_then(|idea| idea.get("title").and_then(Value::as_str))
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
    }

    /// Ids of the story ideas the draft outline offers, or `None` when the
    /// outline records no idea list.
    pub fn offered_ideas(&self) -> Option<Vec<IdeaId>> {
        let outline = self.outline_json()?;
        let ideas = outline.get("story_ideas").and_then(Value::as_array)?;
        Some(
            ideas
                .iter()
                .filter_map(|idea| idea.get("id").and_then(Value::as_str))
                .map(IdeaId::new)
                .collect(),
        )
    }

    /// Panels ordered by sequence index.
    pub fn sorted_panels(&self) -> Vec<Panel> {
        let mut panels = self.panels.clone();
        sort_by_index(&mut panels);
        panels
    }

    fn outline_json(&self) -> Option<Value> {
        let raw = self.chapter_outline.as_deref()?;
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Some(value),
            _ => None,
        }
    }
}

/// Entry of `GET /classrooms/{id}/chapters`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub id: ChapterId,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub story_title: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Previous and next chapters around `current`, ordered by chapter index.
pub fn neighbours<'a>(
    chapters: &'a [ChapterSummary],
    current: &ChapterId,
) -> (Option<&'a ChapterSummary>, Option<&'a ChapterSummary>) {
    let mut ordered: Vec<&ChapterSummary> = chapters.iter().collect();
    ordered.sort_by_key(|chapter| chapter.index);
    match ordered.iter().position(|chapter| &chapter.id == current) {
        Some(pos) => {
            let prev = pos.checked_sub(1).map(|i| ordered[i]);
            let next = ordered.get(pos + 1).copied();
            (prev, next)
        }
        None => (None, None),
    }
}

/// A story idea offered for a new chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryIdea {
    pub id: IdeaId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub theme: Option<String>,
}

/// Result of idea generation: the draft chapter and its candidate ideas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaBatch {
    pub chapter_id: ChapterId,
    #[serde(default, alias = "story_ideas")]
    pub ideas: Vec<StoryIdea>,
}

/// Acknowledgement of `POST /chapters/commit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAck {
    pub chapter_id: ChapterId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Accept RFC 3339 timestamps and the offset-less form the database emits.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
