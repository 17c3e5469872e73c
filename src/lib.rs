pub mod api;
pub mod bot;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod http;
pub mod rate_limiter;
pub mod rating;
pub mod scoring;
pub mod services;
pub mod stats;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;
use colored::Colorize;
use std::sync::Arc;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::database::SqlitePlayerStore;
use crate::domain::SystemClock;
use crate::services::{PlayerService, ServerService};
use crate::stats::{format_rating, format_signed, group_activity, summarize};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let config = AppConfig::from_env()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_init() -> Result<()> {
    let config = AppConfig::from_env()?;
    SqlitePlayerStore::open(&config.store)?;
    println!("Database ready at {}", config.store.database_path.bold());
    Ok(())
}

pub fn handle_rankings() -> Result<()> {
    let service = player_service()?;
    let entries = service.rankings()?;

    if entries.is_empty() {
        println!("No active players.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{:>3}. {:<28} {:>8} {:>8}  {}",
            entry.rank,
            entry.name,
            format_rating(entry.rating).bold(),
            colored_change(entry.rating_change),
            entry.form
        );
    }
    Ok(())
}

pub fn handle_profile(handle: &str) -> Result<()> {
    let service = player_service()?;
    let config = service.config();
    let player = service.profile_by_handle(handle)?;
    let summary = summarize(&player, config.report.form_window);

    println!("{}", summary.name.bold());
    println!("  Rating:  {}", format_rating(summary.rating));
    println!("  High:    {}", format_rating(summary.highest_rating));
    println!("  W/L:     {}/{}", summary.wins, summary.losses);
    println!(
        "  Form:    {} ({})",
        if summary.form.is_empty() { "n/a" } else { summary.form.as_str() },
        colored_change(summary.rating_change)
    );
    if !player.active {
        println!("  {}", "inactive".yellow());
    }

    for year in group_activity(&player.matches, config.report.default_label) {
        println!("\n{}", year.year.to_string().bold());
        for group in year.groups {
            println!("  {}", group.label.italic());
            for entry in group.entries {
                let outcome = if entry.win { "W".green() } else { "L".red() };
                println!("    {} {} {}", outcome, entry.opponent, entry.score);
            }
        }
    }
    Ok(())
}

pub fn handle_set_active(handle: &str, active: bool) -> Result<()> {
    let service = player_service()?;
    let player = service.set_active(handle, active)?;
    let state = if player.active { "active".green() } else { "inactive".yellow() };
    println!("{} is now {}", player.name.bold(), state);
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}

fn player_service() -> Result<PlayerService> {
    let config = AppConfig::from_env()?;
    let store = SqlitePlayerStore::open(&config.store)?;
    Ok(PlayerService::new(
        Arc::new(store),
        Arc::new(SystemClock),
        Arc::new(config),
    ))
}

fn colored_change(change: f64) -> colored::ColoredString {
    let text = format_signed(change);
    if change < 0.0 { text.red() } else { text.green() }
}
