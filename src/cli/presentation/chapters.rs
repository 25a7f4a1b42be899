//! Chapter and idea listings.

use crate::models::{ChapterSummary, IdeaBatch};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde_json::json;

pub fn format_ideas_text(batch: &IdeaBatch) -> String {
    if batch.ideas.is_empty() {
        return format!("Chapter {}: no ideas were generated.", batch.chapter_id);
    }
    let mut output = format!("Draft chapter: {}\n\n", batch.chapter_id);
    for idea in &batch.ideas {
        output.push_str(&format!("  [{}] {}\n", idea.id, idea.title));
        if !idea.summary.is_empty() {
            output.push_str(&format!("      {}\n", idea.summary));
        }
    }
    output.push_str(&format!(
        "\nCommit one with: educomic generate --chapter {} --idea <id>",
        batch.chapter_id
    ));
    output
}

pub fn format_ideas_json(batch: &IdeaBatch) -> String {
    serde_json::to_string_pretty(batch).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_chapters_table(chapters: &[ChapterSummary]) -> String {
    if chapters.is_empty() {
        return "No chapters found.".to_string();
    }
    let mut ordered: Vec<&ChapterSummary> = chapters.iter().collect();
    ordered.sort_by_key(|chapter| chapter.index);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Chapter", "Title", "Created"]);
    for chapter in ordered {
        let created = chapter
            .created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            chapter.index.to_string(),
            chapter.id.to_string(),
            chapter.story_title.clone().unwrap_or_else(|| "-".to_string()),
            created,
        ]);
    }
    table.to_string()
}

pub fn format_chapters_json(chapters: &[ChapterSummary]) -> String {
    let out = json!({ "chapters": chapters, "total": chapters.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_neighbours(
    previous: Option<&ChapterSummary>,
    next: Option<&ChapterSummary>,
) -> String {
    let describe = |chapter: Option<&ChapterSummary>| match chapter {
        Some(c) => match c.story_title.as_deref() {
            Some(title) => format!("{} (#{} {})", c.id, c.index, title),
            None => format!("{} (#{})", c.id, c.index),
        },
        None => "-".to_string(),
    };
    format!("Previous: {}\nNext:     {}", describe(previous), describe(next))
}
