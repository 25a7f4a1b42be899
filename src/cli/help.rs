//! Command-name contract for log spans.

use crate::cli::parse::{Commands, ConfigCommands};

/// Command name string for logging (e.g. "generate", "config.show").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Ideas { .. } => "ideas".to_string(),
        Commands::Generate { .. } => "generate".to_string(),
        Commands::Watch { .. } => "watch".to_string(),
        Commands::Export { .. } => "export".to_string(),
        Commands::Chapters { .. } => "chapters".to_string(),
        Commands::Neighbours { .. } => "neighbours".to_string(),
        Commands::Delete { .. } => "delete".to_string(),
        Commands::Health => "health".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show => "show",
        ConfigCommands::Validate => "validate",
    }
}
