//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ComicError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ComicError) -> String {
    match e {
        ComicError::RemoteUnavailable(_) | ComicError::ConnectionLost { .. } => format!(
            "{}\nCheck that the backend is running (see `educomic health`).",
            e
        ),
        ComicError::GenerationTimedOut { .. } | ComicError::Cancelled => format!(
            "{}\nThe chapter may still finish; resume with `educomic watch <chapter>`.",
            e
        ),
        _ => e.to_string(),
    }
}
