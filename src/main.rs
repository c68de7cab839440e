mod cli;
mod clock;
mod commands;
mod config;
mod controller;
mod filter;
mod logging;
mod model;
mod render;
mod storage;
mod store;
mod ui;

use anyhow::Result;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = config::Config::load_default()?.with_overrides(args.file, args.log_level);
    start_logging(&config);

    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::List { today } => commands::list(&config, today),
        cli::Command::Add {
            short_description,
            details,
            deadline,
            from,
        } => commands::add(&config, short_description, details, deadline, from),
        cli::Command::Delete { row, today, yes } => commands::delete(&config, row, today, yes),
        cli::Command::Tui => commands::tui(&config),
    }
}

/// Logging problems never stop the app; they are reported once on stderr
/// before any UI takes over the terminal.
fn start_logging(config: &config::Config) {
    let level = config
        .log_level
        .clone()
        .unwrap_or_else(|| logging::default_log_level().to_string());
    let Some(dir) = config.log_dir() else {
        eprintln!("todolist: no log directory available, logging disabled");
        return;
    };
    if let Err(err) = logging::init_logging(&level, &dir) {
        eprintln!("todolist: logging disabled: {:#}", err);
        return;
    }
    info!(
        "event=config list_height={} data_file={:?}",
        config.list_height(),
        config.data_file
    );
}
