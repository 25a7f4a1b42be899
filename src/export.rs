//! Document Exporter
//!
//! Lays a chapter's finished panels out into a paginated PDF. Panels are
//! sorted by sequence index, assigned to grid cells page by page, scaled to
//! their cell's max box while keeping the configured aspect ratio, and centred.
//! A panel whose image cannot be embedded is logged and skipped; the rest of
//! the export carries on.

pub mod layout;
pub mod payload;
pub mod pdf;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::backend::HttpTimeouts;
use crate::error::ComicError;
use crate::models::{sort_by_index, Artifact, Chapter};
use crate::session::GenerationSession;

pub use layout::{
    AspectPolicy, ExportSpec, Margins, PagePlan, PageSize, PanelsPerPage, Rect, Spacing,
};
pub use payload::{EmbeddedImage, PayloadResolver};
pub use pdf::PlacedImage;

/// A panel left out of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPanel {
    pub index: i64,
    pub reason: String,
}

impl From<SkippedPanel> for ComicError {
    fn from(skipped: SkippedPanel) -> Self {
        ComicError::EmbedFailure {
            index: skipped.index,
            reason: skipped.reason,
        }
    }
}

/// The finished document, ready to be offered for download.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub embedded: usize,
    pub skipped: Vec<SkippedPanel>,
}

impl ExportedDocument {
    /// Write the document into `dir` under its file name.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ComicError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// File name from the chapter title, or `Chapter N` when there is none.
pub fn document_file_name(title: Option<&str>, chapter_index: i64) -> String {
    let cleaned: String = title
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();
    let stem = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if stem.is_empty() {
        format!("Chapter {}.pdf", chapter_index)
    } else {
        format!("{}.pdf", stem)
    }
}

pub struct DocumentExporter {
    resolver: PayloadResolver,
}

impl DocumentExporter {
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, ComicError> {
        Ok(Self {
            resolver: PayloadResolver::new(timeouts)?,
        })
    }

    /// Export a chapter fetched from the backend.
    pub async fn export_chapter(
        &self,
        chapter: &Chapter,
        spec: &ExportSpec,
    ) -> Result<ExportedDocument, ComicError> {
        let title = chapter.title();
        self.export(&chapter.panels, spec, title.as_deref(), chapter.index)
            .await
    }

    /// Export the artifacts of a finished generation session.
    pub async fn export_session(
        &self,
        session: &GenerationSession,
        spec: &ExportSpec,
    ) -> Result<ExportedDocument, ComicError> {
        self.export(
            &session.artifacts,
            spec,
            session.title.as_deref(),
            session.chapter_index,
        )
        .await
    }

    pub async fn export(
        &self,
        artifacts: &[Artifact],
        spec: &ExportSpec,
        title: Option<&str>,
        chapter_index: i64,
    ) -> Result<ExportedDocument, ComicError> {
        if artifacts.is_empty() {
            return Err(ComicError::NothingToExport);
        }
        let mut ordered = artifacts.to_vec();
        sort_by_index(&mut ordered);

        let plans = layout::plan_pages(ordered.len(), spec)?;
        let spacing = spec.spacing.points();
        let mut remaining = ordered.iter();
        let mut pages = Vec::with_capacity(plans.len());
        let mut skipped = Vec::new();
        let mut embedded = 0usize;

        for plan in &plans {
            let mut placed = Vec::with_capacity(plan.cells.len());
            for (cell, artifact) in plan.cells.iter().zip(remaining.by_ref()) {
                let image = match self.resolver.load(&artifact.image).await {
                    Ok(image) => image,
                    Err(reason) => {
                        warn!(
                            panel = artifact.index,
                            panel_id = %artifact.id,
                            reason = %reason,
                            "Skipping panel that could not be embedded"
                        );
                        skipped.push(SkippedPanel {
                            index: artifact.index,
                            reason,
                        });
                        continue;
                    }
                };
                let ratio = match spec.aspect {
                    AspectPolicy::Square => 1.0,
                    AspectPolicy::Native => image.aspect_ratio(),
                };
                let rect = layout::place_in_cell(cell, spacing, ratio);
                placed.push(PlacedImage { image, rect });
                embedded += 1;
            }
            pages.push(placed);
        }

        if embedded == 0 {
            return Err(ComicError::DocumentAssemblyFailure(
                "No panel could be embedded".to_string(),
            ));
        }

        let file_name = document_file_name(title, chapter_index);
        let doc_title = file_name.trim_end_matches(".pdf").to_string();
        let bytes = pdf::assemble(spec.page_size, &pages, &doc_title)?;
        info!(
            file = %file_name,
            pages = pages.len(),
            embedded,
            skipped = skipped.len(),
            "Export complete"
        );

        Ok(ExportedDocument {
            file_name,
            bytes,
            page_count: pages.len(),
            embedded,
            skipped,
        })
    }
}
