//! Command-line interface module.

mod args;
pub mod build;
pub mod clean;
pub mod list;
pub mod serve;

pub use args::{Cli, Commands, ListArgs};

use std::path::Path;

use anyhow::{Context, Result};
use sluice::PipelineConfig;
use sluice::config::{CONFIG_FILE, find_config_file};

/// Locate and load the config, then apply command-line overrides.
///
/// Without `-C` the config is searched upward from the current directory.
/// When none is found, the current directory becomes the asset root.
pub fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(Path::new(CONFIG_FILE)),
    };

    let mut config = match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            sluice::debug!("config"; "no {} found, using {} as root", CONFIG_FILE, cwd.display());
            PipelineConfig::with_root(cwd)
        }
    };

    apply_overrides(&mut config, &cli.command);
    Ok(config)
}

fn apply_overrides(config: &mut PipelineConfig, command: &Commands) {
    match command {
        Commands::Serve {
            interface,
            port,
            public,
            compress,
        } => {
            if let Some(interface) = interface {
                config.serve.interface = *interface;
            }
            if let Some(port) = port {
                config.serve.port = *port;
            }
            if let Some(public) = public {
                config.serve.public = sluice::utils::path::normalize_path(public);
            }
            if let Some(compress) = compress {
                config.compress = *compress;
            }
        }
        Commands::Build { compress } => {
            if let Some(compress) = compress {
                config.compress = *compress;
            }
        }
        Commands::List { args } => {
            if let Some(combine) = args.combine {
                config.combine = combine;
            }
        }
        Commands::Clean => {}
    }
}
