//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::Config;

/// Arguments for running the HTTP server.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Interface to listen on (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the database file (overrides config)
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,
}

impl ServeCommand {
    /// Apply command-line overrides on top of loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(database) = &self.database {
            config.storage.database_path = Some(database.clone());
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_serve_overrides_applied() {
        let mut config = Config::default();
        let cmd = ServeCommand {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            database: Some(PathBuf::from("/tmp/x.db")),
        };

        cmd.apply_to(&mut config);

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_serve_without_overrides_keeps_config() {
        let mut config = Config::default();
        ServeCommand {
            host: None,
            port: None,
            database: None,
        }
        .apply_to(&mut config);

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
