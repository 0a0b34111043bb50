mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use purger_core::config::normalize_scopes;
use purger_core::{PurgeConfig, PurgeEngine, SnapshotQuery};
use tracing::{error, info};

// Never `process::exit` here: the log guard flushes the file writer on drop.
fn main() -> ExitCode {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match purger_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let args = Cli::parse();

    match run(&config, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &PurgeConfig, command: Option<Commands>) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Some(Commands::Purge { root, scopes }) => run_purge(config, root, scopes),
        Some(Commands::Purgeable { resource_id }) => run_purgeable(config, resource_id),
        Some(Commands::DeleteTree { root_id, yes }) => run_delete_tree(config, root_id, yes),
        Some(Commands::DeleteSnapshots {
            id,
            resource_id,
            root_project_id,
            root_snapshot_id,
            islast,
            statuses,
            scopes,
            not_purged,
            yes,
        }) => {
            let mut query = SnapshotQuery::new().with_not_purged(not_purged);
            if let Some(id) = id {
                query = query.with_id(id);
            }
            if let Some(resource_id) = resource_id {
                query = query.with_resource_id(resource_id);
            }
            if let Some(root_project_id) = root_project_id {
                query = query.with_root_project_id(root_project_id);
            }
            if let Some(root_snapshot_id) = root_snapshot_id {
                query = query.with_root_snapshot_id(root_snapshot_id);
            }
            if let Some(islast) = islast {
                query = query.with_islast(islast);
            }
            if !statuses.is_empty() {
                query = query.with_statuses(normalize_scopes(statuses));
            }
            if !scopes.is_empty() {
                query = query.with_scopes(normalize_scopes(scopes));
            }
            run_delete_snapshots(config, &query, yes)
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    }
}

fn run_purge(
    config: &PurgeConfig,
    root: i64,
    scopes: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let scopes = if scopes.is_empty() {
        config.scopes_without_history.clone()
    } else {
        normalize_scopes(scopes)
    };

    let engine = PurgeEngine::from_config(config)?;
    let reporter = CliReporter::new();
    let result = engine.purge(root, &scopes, &reporter)?;

    println!();
    info!(
        "{} projects purged in {}",
        format!("{}", result.projects).cyan(),
        format!("{:.2}s", result.duration.as_secs_f64()).green(),
    );
    info!(
        "{} aborted snapshots deleted, {} history snapshots deleted, {} snapshots purged",
        format!("{}", result.aborted_snapshots_deleted).red(),
        format!("{}", result.history_snapshots_deleted).red(),
        format!("{}", result.snapshots_purged).yellow(),
    );
    info!(
        "{} resources disabled",
        format!("{}", result.resources_disabled).yellow(),
    );
    if result.is_noop() {
        info!("Nothing to purge");
    }

    Ok(())
}

fn run_purgeable(config: &PurgeConfig, resource_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let engine = PurgeEngine::from_config(config)?;
    let snapshots = engine.select_purgeable_snapshots(resource_id)?;

    if snapshots.is_empty() {
        println!("No purgeable snapshots for resource {}", resource_id);
        return Ok(());
    }

    println!("{:>10}  {:<25}  {:<6}  {:<4}", "SNAPSHOT", "DATE", "EVENTS", "LAST");
    for snapshot in &snapshots {
        let events = if snapshot.has_events { "yes".yellow() } else { "no".normal() };
        let last = if snapshot.is_last { "yes".green() } else { "no".normal() };
        println!(
            "{:>10}  {:<25}  {:<6}  {:<4}",
            snapshot.snapshot_id,
            snapshot.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            events,
            last
        );
    }
    Ok(())
}

fn run_delete_tree(
    config: &PurgeConfig,
    root_id: i64,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = PurgeEngine::from_config(config)?;
    let root = purger_core::purge::tree::get_resource(engine.database().connection(), root_id)?;

    let prompt = format!(
        "Are you SURE you want to PERMANENTLY DELETE {} [id={}] and all of its resources?",
        root.long_name, root.id
    );
    if !yes && !prompt_confirm(&prompt, Some(false))? {
        return Ok(());
    }

    let deleted = engine.delete_resource_tree(root_id, &CliReporter::new())?;
    println!("{} resources deleted", format!("{}", deleted).red());
    Ok(())
}

fn run_delete_snapshots(
    config: &PurgeConfig,
    query: &SnapshotQuery,
    yes: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if query.is_unbounded() {
        println!("{}", "The query has no constraints and would match every snapshot.".red());
    }
    if !yes && !prompt_confirm("Delete all matching snapshots?", Some(false))? {
        return Ok(());
    }

    let engine = PurgeEngine::from_config(config)?;
    let deleted = engine.delete_snapshots(query)?;
    println!("{} snapshots deleted", format!("{}", deleted).red());
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
