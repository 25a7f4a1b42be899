//! CLI parse: clap types for EduComic. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// EduComic CLI - classroom comic generation and export
#[derive(Parser)]
#[command(name = "educomic")]
#[command(about = "Track EduComic chapter generation and export finished chapters as PDF")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds config/ and is the default export target)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q', default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate story ideas for a new chapter
    Ideas {
        /// Classroom the chapter belongs to
        #[arg(long)]
        classroom: String,
        /// The teacher's outline for the chapter
        #[arg(long)]
        outline: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Commit an idea and follow generation until the chapter is ready
    Generate {
        /// Draft chapter returned by `ideas`
        #[arg(long)]
        chapter: String,
        /// Chosen idea
        #[arg(long)]
        idea: String,
        /// Classroom (looked up from the chapter when omitted)
        #[arg(long)]
        classroom: Option<String>,
        /// Export a PDF once the chapter is ready
        #[arg(long)]
        export: bool,
        #[command(flatten)]
        layout: ExportArgs,
    },
    /// Resume following an existing chapter's generation
    Watch {
        chapter: String,
    },
    /// Export a finished chapter as a PDF
    Export {
        chapter: String,
        #[command(flatten)]
        layout: ExportArgs,
    },
    /// List the chapters of a classroom
    Chapters {
        classroom: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the previous and next chapter around a chapter
    Neighbours {
        classroom: String,
        chapter: String,
    },
    /// Delete a chapter and its panels
    Delete {
        chapter: String,
    },
    /// Check that the backend is reachable
    Health,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Layout overrides for export. Unset flags fall back to `[export]` config.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Page size (a4, letter)
    #[arg(long)]
    pub page_size: Option<String>,
    /// Panels per page (1, 2, 4, 6)
    #[arg(long)]
    pub per_page: Option<String>,
    /// Page margins (none, standard, large)
    #[arg(long)]
    pub margins: Option<String>,
    /// Space between panels (none, small, medium)
    #[arg(long)]
    pub spacing: Option<String>,
    /// Panel aspect ratio (square, native)
    #[arg(long)]
    pub aspect: Option<String>,
    /// Directory the PDF is written to
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the effective configuration
    Validate,
}
