//! `gradebook` - CLI and server entry point
//!
//! This binary runs the HTTP API and offers a few offline commands for
//! inspecting the record database and configuration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use gradebook::cli::{Cli, Command, ConfigCommand, ListCommand, OutputFormat, StatusCommand};
use gradebook::{init_logging, Config, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(serve_cmd) => {
            serve_cmd.apply_to(&mut config);
            config.validate()?;
            gradebook::api::serve(&config)
                .await
                .context("running HTTP server")
        }
        Command::List(list_cmd) => handle_list(&config, &list_cmd),
        Command::Status(status_cmd) => handle_status(&config, &status_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening database {}", path.display()))
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let records = open_storage(config)?.list()?;

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Plain => {
            if records.is_empty() {
                println!("No students recorded.");
            }
            for r in &records {
                println!(
                    "{}  {:<24} math {} ({})  science {} ({})  english {} ({})",
                    r.id,
                    r.name,
                    r.math_score,
                    r.math_letter,
                    r.science_score,
                    r.science_letter,
                    r.english_score,
                    r.english_letter,
                );
            }
        }
    }
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if cmd.json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "total_students": stats.total_students,
            "last_updated": stats.last_updated,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("gradebook status");
        println!("----------------");
        println!("Database:      {}", storage.path().display());
        println!("Students:      {}", stats.total_students);
        match stats.last_updated {
            Some(ts) => println!("Last update:   {}", ts.to_rfc3339()),
            None => println!("Last update:   never"),
        }
        println!("Size (bytes):  {}", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Host:               {}", config.server.host);
                println!("  Port:               {}", config.server.port);
                println!("  CORS enabled:       {}", config.server.cors_enabled);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
