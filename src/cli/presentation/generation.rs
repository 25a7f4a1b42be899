//! Generation progress, poll reports and export results.

use std::path::Path;

use owo_colors::OwoColorize;

use crate::config::ValidationError;
use crate::export::ExportedDocument;
use crate::poller::{PollOutcome, PollProgress, PollReport};
use crate::types::SessionStatus;

fn colored_status(status: SessionStatus) -> String {
    match status {
        SessionStatus::Pending => status.as_str().yellow().to_string(),
        SessionStatus::Ready => status.as_str().green().to_string(),
        SessionStatus::Failed | SessionStatus::TimedOut => status.as_str().red().to_string(),
    }
}

/// One live progress line, printed each time the poller publishes.
pub fn format_progress_line(progress: &PollProgress) -> String {
    let mut line = format!(
        "[{:>5.1}s] {} attempt {} | {} panel(s)",
        progress.elapsed_ms as f64 / 1000.0,
        colored_status(progress.status),
        progress.attempts,
        progress.artifact_count,
    );
    if progress.consecutive_errors > 0 {
        line.push_str(&format!(
            " | {} failed fetch(es) in a row",
            progress.consecutive_errors
        ));
    }
    line
}

pub fn format_poll_report(report: &PollReport) -> String {
    let chapter = &report.session.session_id;
    match &report.outcome {
        PollOutcome::Ready(artifacts) => format!(
            "{} Chapter {} is ready with {} panel(s) after {} attempt(s).",
            "✓".green(),
            chapter,
            artifacts.len(),
            report.state.attempts
        ),
        PollOutcome::Failed { reason } => {
            format!("{} Chapter {} failed: {}", "✗".red(), chapter, reason)
        }
        PollOutcome::ConnectionLost { attempts } => format!(
            "{} Lost connection while following chapter {} ({} attempts).",
            "✗".red(),
            chapter,
            attempts
        ),
        PollOutcome::TimedOut { attempts } => format!(
            "{} Gave up on chapter {} after {} attempts; it may still finish.",
            "!".yellow(),
            chapter,
            attempts
        ),
        PollOutcome::Cancelled => format!("Stopped following chapter {}.", chapter),
    }
}

pub fn format_export_result(document: &ExportedDocument, path: &Path) -> String {
    let mut output = format!(
        "Wrote {} ({} page(s), {} panel(s))",
        path.display(),
        document.page_count,
        document.embedded
    );
    for skipped in &document.skipped {
        output.push_str(&format!(
            "\n  {} panel {} skipped: {}",
            "!".yellow(),
            skipped.index,
            skipped.reason
        ));
    }
    output
}

pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    let mut output = format!("Configuration has {} problem(s):\n", errors.len());
    for error in errors {
        output.push_str(&format!("  - {}\n", error));
    }
    output
}
