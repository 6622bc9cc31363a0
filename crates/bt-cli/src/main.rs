use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bt_cli::commands::util::parse_datetime;
use bt_cli::commands::{
    diaper_stats, edit, events, feed_stats, import, log, sleep, sleep_stats, status, timeline,
    weight_stats,
};
use bt_cli::{Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(bt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = bt_db::Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let calendar = config.calendar().context("invalid day_start_hour")?;
    let now = Utc::now();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Log(args) => log::run(&mut out, &mut db, &calendar, args, now)?,
        Commands::Sleep { at } => {
            let at = at.as_deref().map(parse_datetime).transpose()?.unwrap_or(now);
            sleep::run(&mut out, &mut db, &calendar, at)?;
        }
        Commands::Edit(args) => edit::run(&mut out, &mut db, args)?,
        Commands::Delete { id } => edit::delete(&mut out, &mut db, *id)?,
        Commands::Events {
            kind,
            after,
            before,
            limit,
        } => {
            let after = after.as_deref().map(parse_datetime).transpose()?;
            let before = before.as_deref().map(parse_datetime).transpose()?;
            events::run(&mut out, &db, *kind, after, before, *limit)?;
        }
        Commands::SleepStats(args) => sleep_stats::run(
            &mut out,
            &db,
            &calendar,
            &config.night_config(),
            args.days.unwrap_or(config.stats_days),
            args.json,
            now,
        )?,
        Commands::FeedStats(args) => feed_stats::run(
            &mut out,
            &db,
            &calendar,
            args.days.unwrap_or(config.stats_days),
            args.json,
            now,
        )?,
        Commands::DiaperStats(args) => diaper_stats::run(
            &mut out,
            &db,
            &calendar,
            args.days.unwrap_or(config.stats_days),
            args.json,
            now,
        )?,
        Commands::WeightStats { reference, json } => {
            let reference = reference
                .as_deref()
                .or(config.growth_reference.as_deref())
                .map(weight_stats::load_reference)
                .transpose()?;
            weight_stats::run(&mut out, &db, &calendar, reference.as_ref(), *json)?;
        }
        Commands::Timeline { kind, pages, json } => timeline::run(
            &mut out,
            &db,
            &calendar,
            &config.night_config(),
            (*kind).into(),
            *pages,
            *json,
            now,
        )?,
        Commands::Import { path } => {
            import::run(&mut out, &mut db, path)?;
        }
        Commands::Status => status::run(&mut out, &db, &config, &calendar, now)?,
    }

    Ok(())
}
