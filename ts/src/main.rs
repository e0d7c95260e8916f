use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};
use uuid::Uuid;

use templatestore::cli::{Cli, Command};
use templatestore::config::Config;
use templatestore::{MemorySettings, OverrideStore, TemplateCatalog, TemplateRecord};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))
}

fn print_record(record: &TemplateRecord) {
    let origin = if record.is_user_defined { "user".yellow() } else { "built-in".dimmed() };
    let state = if record.enabled { "".normal() } else { " (disabled)".red() };
    println!(
        "{} {} [{}] {}{}",
        record.id_str().cyan(),
        record.name.bold(),
        record.context_str(),
        origin,
        state
    );
    if !record.description.is_empty() {
        println!("    {}", record.description);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref())?;

    if let Some(path) = cli.override_file {
        config.override_file = path;
    }
    info!(override_file = ?config.override_file, "tpl starting");

    let store = OverrideStore::open(&config.override_file, Arc::new(MemorySettings::new()));
    let mut catalog = TemplateCatalog::new(config.definition_source(), Some(Arc::new(config.registry())), store);
    if let Err(e) = catalog.initialize() {
        eprintln!("{} built-in templates unavailable: {}", "warning:".yellow(), e);
    }

    match cli.command {
        Command::List { context, all } => {
            let records = match (context, all) {
                (Some(context), false) => catalog.list_by_context(&context),
                (Some(context), true) => catalog
                    .list_all()
                    .into_iter()
                    .filter(|r| r.context_id.as_deref() == Some(context.as_str()))
                    .collect(),
                (None, false) => catalog.list(),
                (None, true) => catalog.list_all(),
            };
            if records.is_empty() {
                println!("No templates found");
            }
            for record in &records {
                print_record(record);
            }
        }
        Command::Show { id } => {
            let record = catalog.get(&id).ok_or_else(|| eyre!("Template not found: {}", id))?;
            print_record(&record);
            println!("{}", record.body);
        }
        Command::Add {
            id,
            name,
            description,
            context,
            body,
        } => {
            let id = id.unwrap_or_else(|| Uuid::now_v7().to_string());
            catalog.add(TemplateRecord::new(&id, name, context, body).with_description(description))?;
            catalog.save()?;
            println!("{} Added template: {}", "✓".green(), id.cyan());
        }
        Command::Update {
            id,
            name,
            description,
            context,
            body,
        } => {
            let mut record = catalog.get(&id).ok_or_else(|| eyre!("Template not found: {}", id))?;
            debug!(%id, "updating fields");
            if let Some(name) = name {
                record.name = name;
            }
            if let Some(description) = description {
                record.description = description;
            }
            if let Some(context) = context {
                record.context_id = Some(context);
            }
            if let Some(body) = body {
                record.body = body;
            }
            catalog.update(record)?;
            catalog.save()?;
            println!("{} Updated template: {}", "✓".green(), id.cyan());
        }
        Command::Remove { id } => {
            catalog.remove(&id)?;
            catalog.save()?;
            println!("{} Removed template: {}", "✓".green(), id);
        }
        Command::Enable { id } => {
            catalog.set_enabled(&id, true)?;
            catalog.save()?;
            println!("{} Enabled template: {}", "✓".green(), id.cyan());
        }
        Command::Disable { id } => {
            catalog.set_enabled(&id, false)?;
            catalog.save()?;
            println!("{} Disabled template: {}", "✓".green(), id.cyan());
        }
        Command::Revert { id } => {
            if catalog.revert(&id) {
                catalog.save()?;
                println!("{} Reverted template: {}", "✓".green(), id.cyan());
            } else {
                println!("No user override for: {}", id);
            }
        }
        Command::RestoreDeleted => {
            let restored = catalog.restore_deleted();
            catalog.save()?;
            println!("{} Restored {} deleted template(s)", "✓".green(), restored);
        }
        Command::RestoreDefaults => {
            catalog.restore_defaults();
            catalog.save()?;
            println!("{} Restored default templates", "✓".green());
        }
        Command::Contexts => {
            for context in &config.contexts {
                println!("{} {}", context.id.cyan(), context.name);
            }
        }
        Command::Export => {
            print!("{}", catalog.export()?);
        }
    }

    Ok(())
}
