//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `resolve`: best match for one track across all catalogs
//! - `search`: raw results from a single catalog
//! - `backfill`: fill missing lyrics and covers for a directory
//! - `config`: show the effective configuration

mod backfill;
mod config;
mod resolve;
mod search;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

pub use backfill::cmd_backfill;
pub use config::cmd_config;
pub use resolve::cmd_resolve;
pub use search::cmd_search;

use crate::config::{self as app_config, Config};
use crate::search::Query;

/// Cover art and lyrics lookup across music catalogs
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "METAFILL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Track fields shared by the lookup commands
#[derive(clap::Args, Debug, Clone)]
pub struct TrackArgs {
    /// Track title
    pub title: String,
    /// Artist name(s)
    #[arg(short, long, default_value = "")]
    pub artist: String,
    /// Album name
    #[arg(short = 'l', long, default_value = "")]
    pub album: String,
}

impl TrackArgs {
    pub fn query(&self) -> Query {
        Query::new(&self.title, &self.artist, &self.album)
    }
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Find the best cover and lyrics for one track
    Resolve {
        #[command(flatten)]
        track: TrackArgs,
        /// Print the full lyrics
        #[arg(long)]
        lyrics: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Query a single catalog (qq, netease, kugou)
    Search {
        /// Catalog tag or letter
        provider: String,
        #[command(flatten)]
        track: TrackArgs,
        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fill missing lyrics and covers for every audio file under a path
    Backfill {
        /// File or directory to process
        path: PathBuf,
        /// Write .lrc and cover files next to each track
        #[arg(long)]
        write: bool,
        /// Tracks resolved at once (overrides the config)
        #[arg(short, long)]
        concurrency: Option<usize>,
        /// Skip the embedded/sidecar artwork check
        #[arg(long)]
        no_local: bool,
    },
    /// Show the effective configuration and where it lives
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

/// Load the config from `--config` or the default location.
pub(crate) fn load_config(cli: &Cli) -> Config {
    match &cli.config {
        Some(path) => app_config::load_from(path),
        None => app_config::load(),
    }
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli);

    match &cli.command {
        Commands::Resolve {
            track,
            lyrics,
            json,
        } => {
            let rt = Runtime::new()?;
            cmd_resolve(&rt, &config, &track.query(), *lyrics, *json)
        }
        Commands::Search {
            provider,
            track,
            json,
        } => {
            let rt = Runtime::new()?;
            cmd_search(&rt, &config, provider, &track.query(), *json)
        }
        Commands::Backfill {
            path,
            write,
            concurrency,
            no_local,
        } => {
            let mut config = config;
            if let Some(n) = concurrency {
                config.batch.concurrency = *n;
            }
            if *no_local {
                config.batch.local_first = false;
            }
            let rt = Runtime::new()?;
            cmd_backfill(&rt, &config, path, *write)
        }
        Commands::Config { save } => cmd_config(&config, cli.config.as_deref(), *save),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Print one line per field, skipping empty ones.
pub(crate) fn print_field(label: &str, value: &str) {
    if !value.trim().is_empty() {
        println!("  {:<8}{}", format!("{}:", label), value);
    }
}
