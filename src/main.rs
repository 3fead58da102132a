//! font-tool - locate and rewrite font-size markers in React sources, then
//! push the change to live clients.

mod cli;
mod client;
mod config;
mod control;
mod dom;
mod locate;
mod logger;
mod marker;
mod patch;
mod reload;
mod shutdown;
mod utils;
mod workspace;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{ToolConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    shutdown::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(ToolConfig::load(&cli)?);

    match &cli.command {
        Commands::Scan { pretty, .. } => cli::scan::run_scan(&config, *pretty),
        Commands::Apply { input, root, json } => {
            cli::apply::run_apply(&config, input, root.is_some(), *json)
        }
        Commands::Serve { .. } => cli::serve::run_serve(),
        Commands::Watch {
            page,
            write,
            editor,
            ..
        } => cli::watch::run_watch(&config, page.as_deref(), *write, *editor),
        Commands::Status { .. } => cli::watch::run_status(&config),
        Commands::Show { file, lines, .. } => cli::show::run_show(&config, file, lines),
    }
}
