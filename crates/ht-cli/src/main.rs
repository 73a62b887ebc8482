use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use ht_core::{Clock, PersonalEvent, SystemClock};
use tracing_subscriber::EnvFilter;

use ht_cli::commands::util::{confirm_long_entry, parse_date, parse_day};
use ht_cli::commands::{
    away, day, entry, events, holidays, progress, recent, start_date, status,
};
use ht_cli::{Cli, Commands, Config, EventAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ht_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ht_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let clock = SystemClock;
    let mut out = io::stdout().lock();

    match cli.command {
        Some(Commands::Log { entry: args, day, yes }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let day = parse_day(&day, &clock)?;
            entry::log(&mut out, &mut db, day, args, &clock, confirm_long_entry(yes))?;
        }
        Some(Commands::Edit {
            day,
            index,
            changes,
            yes,
        }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let day = parse_day(&day, &clock)?;
            entry::edit(&mut out, &mut db, day, index, changes, confirm_long_entry(yes))?;
        }
        Some(Commands::Delete { day, index }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let day = parse_day(&day, &clock)?;
            entry::delete(&mut out, &mut db, day, index)?;
        }
        Some(Commands::Purge { id }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            entry::purge(&mut out, &db, id)?;
        }
        Some(Commands::Away { day, reason, notes }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let day = parse_day(&day, &clock)?;
            away::away(&mut out, &mut db, day, reason, notes)?;
        }
        Some(Commands::Back { day }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            let day = parse_day(&day, &clock)?;
            away::back(&mut out, &mut db, day)?;
        }
        Some(Commands::Day { day: key, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let key = parse_day(&key, &clock)?;
            day::run(&mut out, &db, key, json)?;
        }
        Some(Commands::Recent { limit, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            recent::run(&mut out, &db, limit, json)?;
        }
        Some(Commands::Progress { json }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            progress::run(&mut out, &db, config.training_start_date, json, &clock)?;
        }
        Some(Commands::StartDate { date }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            let date = parse_date(&date)?;
            start_date::run(&mut out, &db, date, &clock)?;
        }
        Some(Commands::Holidays { year }) => {
            // Holidays are computed, not stored; no database needed
            let year = year.unwrap_or_else(|| clock.today().year());
            holidays::run(&mut out, year)?;
        }
        Some(Commands::Event { action }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                EventAction::Add {
                    title,
                    date,
                    kind,
                    repeat,
                    every,
                    description,
                } => {
                    let date = parse_day(&date, &clock)?.date();
                    let mut event = PersonalEvent::new(title, kind, date).repeating(repeat, every);
                    event.description = description;
                    events::add(&mut out, &db, &event)?;
                }
                EventAction::List { day } => {
                    let day = day.map(|d| parse_day(&d, &clock)).transpose()?;
                    events::list(&mut out, &db, day)?;
                }
                EventAction::Remove { id } => events::remove(&mut out, &db, id)?,
            }
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut out, &db, &config, &clock)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
