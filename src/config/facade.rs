//! Config loader: assembles the source layers and deserializes the result.

use std::path::Path;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use tracing::debug;

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::EduComicConfig;
use crate::error::ComicError;

/// Environment variable selecting the workspace environment file.
pub const ENV_NAME_VAR: &str = "EDUCOMIC_ENV";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from all layers for `workspace_root`.
    ///
    /// Precedence (lowest to highest): defaults, user config file,
    /// `config/config.toml`, `config/{EDUCOMIC_ENV}.toml`, `EDUCOMIC__*` env vars.
    pub fn load(workspace_root: &Path) -> Result<EduComicConfig, ComicError> {
        let global = global_file::global_config_path();
        let env_name = std::env::var(ENV_NAME_VAR).ok();
        Self::load_layers(global.as_deref(), workspace_root, env_name.as_deref())
    }

    /// Load with explicit file layers. Environment variables still apply last.
    pub fn load_layers(
        global: Option<&Path>,
        workspace_root: &Path,
        env_name: Option<&str>,
    ) -> Result<EduComicConfig, ComicError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root, env_name)?;
        Self::finish(builder)
    }

    /// Load from a single explicit file; replaces the file layers.
    pub fn load_from_file(path: &Path) -> Result<EduComicConfig, ComicError> {
        if !path.exists() {
            return Err(ComicError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder = builder_with_defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<EduComicConfig, ComicError> {
        let builder = builder.add_source(
            Environment::with_prefix("EDUCOMIC")
                .separator("__")
                .try_parsing(true),
        );
        let config: EduComicConfig = builder.build()?.try_deserialize()?;
        debug!(base_url = %config.api.base_url, "Configuration loaded");
        Ok(config)
    }
}

