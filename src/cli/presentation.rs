//! CLI presentation: text and json formatters per command family.

mod chapters;
mod generation;

pub use chapters::{
    format_chapters_json, format_chapters_table, format_ideas_json, format_ideas_text,
    format_neighbours,
};
pub use generation::{
    format_export_result, format_poll_report, format_progress_line, format_validation_errors,
};
