//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, ExportArgs};
pub use presentation::{
    format_chapters_json, format_chapters_table, format_export_result, format_ideas_json,
    format_ideas_text, format_neighbours, format_poll_report, format_progress_line,
    format_validation_errors,
};
pub use route::RunContext;
