//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use sluice::AssetType;
use std::path::PathBuf;

/// On-demand asset build cache
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: sluice.toml, searched upward)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve assets over HTTP, building them on first request
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory served for requests no pipe matches
        #[arg(long, value_hint = clap::ValueHint::DirPath)]
        public: Option<PathBuf>,

        /// Compress served artifacts (overrides `compress`)
        #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        compress: Option<bool>,
    },

    /// Build every pipe bundle into the cache
    #[command(visible_alias = "b")]
    Build {
        /// Compress the bundles (overrides `compress`)
        #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        compress: Option<bool>,
    },

    /// List servable assets for pipes
    #[command(visible_alias = "l")]
    List {
        #[command(flatten)]
        args: ListArgs,
    },

    /// Delete the cache directory
    Clean,
}

/// List command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ListArgs {
    /// Pipe names (default: every configured pipe)
    #[arg(value_name = "PIPE")]
    pub pipes: Vec<String>,

    /// Only list one asset type (css or js)
    #[arg(short, long = "type", value_name = "TYPE")]
    pub ty: Option<AssetType>,

    /// List bundles instead of members (overrides `combine`)
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub combine: Option<bool>,

    /// Print the registry as JSON
    #[arg(short, long)]
    pub json: bool,
}
