//! Sluice - an on-demand asset build cache.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    sluice::logger::set_verbose(cli.verbose);

    let config = cli::load_config(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(config),
        Commands::Build { .. } => cli::build::build_all(config).map(|_| ()),
        Commands::List { args } => cli::list::run_list(args, config),
        Commands::Clean => cli::clean::clean(&config),
    }
}
