//! texbuild - rebuild a LaTeX document whenever its sources change.

mod actor;
mod cli;
mod config;
mod core;
mod logger;
mod pipeline;
mod report;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ProjectConfig;
use crate::core::ProjectDirs;
use utils::path::normalize_path;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose());

    // Neither needs a config or any tools.
    if cli.is_init() || cli.is_clean() {
        let dirs = ProjectDirs::new(normalize_path(&cli.root));
        return if cli.is_init() {
            cli::init::init_project(&dirs)
        } else {
            cli::clean::clean_project(&dirs)
        };
    }

    let config = ProjectConfig::load(&cli)?;

    match &cli.command {
        Commands::Once { build_args } => {
            if !cli::build::build_once(&config, &build_args.document)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Loop { build_args, .. } => cli::watch::watch_loop(&config, &build_args.document),
        Commands::Copy { .. } => cli::build::copy_sources(&config),
        Commands::Clean | Commands::Init => unreachable!("handled before loading config"),
    }
}
