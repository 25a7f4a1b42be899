//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};

use crate::backend::{ComicBackend, HttpBackend};
use crate::cli::command_name;
use crate::cli::parse::{Commands, ConfigCommands, ExportArgs};
use crate::cli::presentation::{
    format_chapters_json, format_chapters_table, format_export_result, format_ideas_json,
    format_ideas_text, format_neighbours, format_poll_report, format_progress_line,
    format_validation_errors,
};
use crate::config::{ConfigLoader, EduComicConfig};
use crate::error::ComicError;
use crate::export::{DocumentExporter, ExportSpec};
use crate::models::neighbours;
use crate::poller::{PollOutcome, PollProgress, PollReport, StatusPoller};
use crate::scheduler::TokioScheduler;
use crate::session::{start_session, SessionHandle, SessionRegistry};
use crate::types::{ChapterId, ClassroomId, IdeaId};

/// Runtime context for CLI execution: effective config and domain services.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    config: EduComicConfig,
    workspace_root: PathBuf,
    backend: Arc<dyn ComicBackend>,
    registry: SessionRegistry,
    exporter: DocumentExporter,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ComicError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        let timeouts = config.api.timeouts();
        let backend = Arc::new(HttpBackend::new(config.api.base_url.clone(), timeouts)?);
        Self::with_backend(config, workspace_root, backend)
    }

    /// Run context over an explicit backend.
    pub fn with_backend(
        config: EduComicConfig,
        workspace_root: PathBuf,
        backend: Arc<dyn ComicBackend>,
    ) -> Result<Self, ComicError> {
        let exporter = DocumentExporter::new(config.api.timeouts())?;
        Ok(Self {
            config,
            workspace_root,
            backend,
            registry: SessionRegistry::new(),
            exporter,
        })
    }

    pub fn config(&self) -> &EduComicConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ComicError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ComicError::ConfigError(format!("Failed to start runtime: {}", e)))?;
        runtime.block_on(self.execute_async(command))
    }

    /// Async entry point of the route table.
    pub async fn execute_async(&self, command: &Commands) -> Result<String, ComicError> {
        let name = command_name(command);
        let started = Instant::now();
        let result = self
            .route(command)
            .instrument(info_span!("command", name = %name))
            .await;
        let duration_ms = started.elapsed().as_millis();
        match &result {
            Ok(_) => info!(command = %name, duration_ms, "Command finished"),
            Err(e) => warn!(command = %name, duration_ms, error = %e, "Command failed"),
        }
        result
    }

    async fn route(&self, command: &Commands) -> Result<String, ComicError> {
        match command {
            Commands::Ideas {
                classroom,
                outline,
                format,
            } => {
                if outline.trim().is_empty() {
                    return Err(ComicError::InvalidChoice(
                        "Chapter outline cannot be empty".to_string(),
                    ));
                }
                let batch = self
                    .backend
                    .generate_ideas(&ClassroomId::new(classroom.as_str()), outline)
                    .await?;
                Ok(if format == "json" {
                    format_ideas_json(&batch)
                } else {
                    format_ideas_text(&batch)
                })
            }
            Commands::Generate {
                chapter,
                idea,
                classroom,
                export,
                layout,
            } => {
                let spec = if *export {
                    Some(self.export_spec(layout)?)
                } else {
                    None
                };
                let chapter = ChapterId::new(chapter.as_str());
                let classroom = match classroom {
                    Some(classroom) => ClassroomId::new(classroom.as_str()),
                    None => self.classroom_of(&chapter).await?,
                };
                let handle = start_session(
                    self.backend.as_ref(),
                    &self.registry,
                    &classroom,
                    &chapter,
                    &IdeaId::new(idea.as_str()),
                )
                .await?;
                let report = self.follow(handle).await?;
                let mut output = format_poll_report(&report);
                if let Some(spec) = spec.filter(|_| report.outcome.is_ready()) {
                    let document = self.exporter.export_session(&report.session, &spec).await?;
                    let path = document.write_to_dir(&self.output_dir(layout))?;
                    output.push('\n');
                    output.push_str(&format_export_result(&document, &path));
                }
                finish(report, output)
            }
            Commands::Watch { chapter } => {
                let handle =
                    SessionHandle::resume(&self.registry, ChapterId::new(chapter.as_str()))?;
                let report = self.follow(handle).await?;
                let output = format_poll_report(&report);
                finish(report, output)
            }
            Commands::Export { chapter, layout } => {
                let spec = self.export_spec(layout)?;
                let chapter = self
                    .backend
                    .get_chapter(&ChapterId::new(chapter.as_str()))
                    .await?;
                let document = self.exporter.export_chapter(&chapter, &spec).await?;
                let path = document.write_to_dir(&self.output_dir(layout))?;
                Ok(format_export_result(&document, &path))
            }
            Commands::Chapters { classroom, format } => {
                let chapters = self
                    .backend
                    .list_chapters(&ClassroomId::new(classroom.as_str()))
                    .await?;
                Ok(if format == "json" {
                    format_chapters_json(&chapters)
                } else {
                    format_chapters_table(&chapters)
                })
            }
            Commands::Neighbours { classroom, chapter } => {
                let chapters = self
                    .backend
                    .list_chapters(&ClassroomId::new(classroom.as_str()))
                    .await?;
                let current = ChapterId::new(chapter.as_str());
                if !chapters.iter().any(|c| c.id == current) {
                    return Err(ComicError::NotFound(format!(
                        "Chapter {} is not in classroom {}",
                        current, classroom
                    )));
                }
                let (previous, next) = neighbours(&chapters, &current);
                Ok(format_neighbours(previous, next))
            }
            Commands::Delete { chapter } => {
                let chapter = ChapterId::new(chapter.as_str());
                if self.registry.is_observed(&chapter) {
                    return Err(ComicError::AlreadyObserved(chapter.to_string()));
                }
                self.backend.delete_chapter(&chapter).await?;
                Ok(format!("Deleted chapter {}", chapter))
            }
            Commands::Health => {
                let status = self.backend.health().await?;
                Ok(format!("Backend is {}", status))
            }
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, ComicError> {
        match command {
            ConfigCommands::Show => toml::to_string_pretty(&self.config)
                .map_err(|e| ComicError::ConfigError(format!("Failed to render config: {}", e))),
            ConfigCommands::Validate => match self.config.validate() {
                Ok(()) => Ok("Configuration is valid.".to_string()),
                Err(errors) => Err(ComicError::ConfigError(format_validation_errors(&errors))),
            },
        }
    }

    async fn classroom_of(&self, chapter: &ChapterId) -> Result<ClassroomId, ComicError> {
        self.backend
            .get_chapter(chapter)
            .await?
            .classroom_id
            .ok_or_else(|| {
                ComicError::InvalidChoice(format!(
                    "Chapter {} has no classroom; pass --classroom",
                    chapter
                ))
            })
    }

    /// Poll until terminal, printing a progress line per published update.
    /// Ctrl-C cancels observation only; the backend job keeps running.
    async fn follow(&self, handle: SessionHandle) -> Result<PollReport, ComicError> {
        let poller = StatusPoller::new(
            handle,
            Arc::clone(&self.backend),
            Arc::new(TokioScheduler),
            self.config.polling.policy(),
        );
        let guard = poller.spawn();
        let printer = tokio::spawn(print_progress(guard.progress()));

        let interrupted = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => true,
            _ = wait_finished(guard.progress()) => false,
        };
        if interrupted {
            warn!("Interrupted; stopping observation");
            guard.cancel();
        }
        let report = guard.wait().await;
        if let Err(e) = printer.await {
            warn!(error = %e, "Progress printer failed");
        }
        report
    }

    fn export_spec(&self, args: &ExportArgs) -> Result<ExportSpec, ComicError> {
        let base = self.config.export.spec()?;
        Ok(ExportSpec {
            page_size: parse_flag(args.page_size.as_deref(), base.page_size)?,
            panels_per_page: parse_flag(args.per_page.as_deref(), base.panels_per_page)?,
            margins: parse_flag(args.margins.as_deref(), base.margins)?,
            spacing: parse_flag(args.spacing.as_deref(), base.spacing)?,
            aspect: parse_flag(args.aspect.as_deref(), base.aspect)?,
        })
    }

    fn output_dir(&self, args: &ExportArgs) -> PathBuf {
        let dir = args
            .out
            .clone()
            .unwrap_or_else(|| self.config.export.output_dir.clone());
        resolve_against(&self.workspace_root, &dir)
    }
}

fn parse_flag<T>(value: Option<&str>, fallback: T) -> Result<T, ComicError>
where
    T: std::str::FromStr<Err = String>,
{
    match value {
        Some(raw) => raw.parse().map_err(ComicError::InvalidChoice),
        None => Ok(fallback),
    }
}

fn resolve_against(root: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        root.join(dir)
    }
}

/// Map a non-ready outcome to its error so the process exits non-zero.
fn finish(report: PollReport, output: String) -> Result<String, ComicError> {
    match report.outcome {
        PollOutcome::Ready(_) | PollOutcome::Cancelled => Ok(output),
        other => {
            eprintln!("{}", output);
            other.into_result().map(|_| output)
        }
    }
}

async fn print_progress(mut progress: watch::Receiver<PollProgress>) {
    while progress.changed().await.is_ok() {
        let line = format_progress_line(&progress.borrow_and_update());
        eprintln!("{}", line);
    }
}

async fn wait_finished(mut progress: watch::Receiver<PollProgress>) {
    loop {
        if progress.borrow_and_update().finished {
            return;
        }
        if progress.changed().await.is_err() {
            return;
        }
    }
}
