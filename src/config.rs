//! Configuration System
//!
//! Hierarchical configuration: built-in defaults, the user config file, the
//! workspace `config/` files, then `EDUCOMIC__*` environment variables.
//! Everything the tracker and exporter need is handed to them explicitly from
//! here; no component reads the environment on its own.

use crate::backend::HttpTimeouts;
use crate::error::ComicError;
use crate::export::{AspectPolicy, ExportSpec, Margins, PageSize, PanelsPerPage, Spacing};
use crate::logging::LoggingConfig;
use crate::poller::PollPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EduComicConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            connect: Duration::from_secs(self.connect_timeout_secs),
            request: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Status poller budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
}

fn default_interval_ms() -> u64 {
    PollPolicy::DEFAULT_INTERVAL.as_millis() as u64
}

fn default_max_attempts() -> u32 {
    PollPolicy::DEFAULT_MAX_ATTEMPTS
}

fn default_max_consecutive_errors() -> u32 {
    PollPolicy::DEFAULT_MAX_CONSECUTIVE_ERRORS
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

impl PollingConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_attempts: self.max_attempts,
            max_consecutive_errors: self.max_consecutive_errors,
        }
    }
}

/// Export defaults; CLI flags override them per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_page_size")]
    pub page_size: String,

    #[serde(default = "default_panels_per_page")]
    pub panels_per_page: u32,

    #[serde(default = "default_margins")]
    pub margins: String,

    #[serde(default = "default_spacing")]
    pub spacing: String,

    #[serde(default = "default_aspect")]
    pub aspect: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_page_size() -> String {
    PageSize::default().to_string()
}

fn default_panels_per_page() -> u32 {
    PanelsPerPage::default().count() as u32
}

fn default_margins() -> String {
    Margins::default().to_string()
}

fn default_spacing() -> String {
    Spacing::default().to_string()
}

fn default_aspect() -> String {
    AspectPolicy::default().to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            panels_per_page: default_panels_per_page(),
            margins: default_margins(),
            spacing: default_spacing(),
            aspect: default_aspect(),
            output_dir: default_output_dir(),
        }
    }
}

impl ExportConfig {
    pub fn spec(&self) -> Result<ExportSpec, ComicError> {
        Ok(ExportSpec {
            page_size: self.page_size.parse().map_err(ComicError::ConfigError)?,
            panels_per_page: self
                .panels_per_page
                .to_string()
                .parse()
                .map_err(ComicError::ConfigError)?,
            margins: self.margins.parse().map_err(ComicError::ConfigError)?,
            spacing: self.spacing.parse().map_err(ComicError::ConfigError)?,
            aspect: self.aspect.parse().map_err(ComicError::ConfigError)?,
        })
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Api(String),
    Polling(String),
    Export(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Api(msg) => write!(f, "api: {}", msg),
            ValidationError::Polling(msg) => write!(f, "polling: {}", msg),
            ValidationError::Export(msg) => write!(f, "export: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl EduComicConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            errors.push(ValidationError::Api("base_url cannot be empty".to_string()));
        } else if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            errors.push(ValidationError::Api(format!(
                "base_url must be an http(s) address, got '{}'",
                base_url
            )));
        }
        if self.api.request_timeout_secs == 0 {
            errors.push(ValidationError::Api(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.polling.interval_ms == 0 {
            errors.push(ValidationError::Polling(
                "interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.polling.max_attempts == 0 {
            errors.push(ValidationError::Polling(
                "max_attempts must be greater than zero".to_string(),
            ));
        }
        if self.polling.max_consecutive_errors == 0 {
            errors.push(ValidationError::Polling(
                "max_consecutive_errors must be greater than zero".to_string(),
            ));
        }

        if let Err(e) = self.export.spec() {
            errors.push(ValidationError::Export(e.to_string()));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "format must be 'text' or 'json', got '{}'",
                self.logging.format
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
