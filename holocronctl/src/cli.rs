use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "holocronctl", version)]
#[command(
    about = "Browse the film catalog with posters, character portraits and details"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// TOML configuration file (overrides HOLOCRON_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// .env file to load before reading the environment
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Keep resolved image URLs in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List every film, oldest release first
    Films {
        /// Resolve a poster URL for each film
        #[arg(long)]
        posters: bool,
    },

    /// Show one film by slug
    Film {
        /// Film slug, e.g. `the-empire-strikes-back`
        slug: String,

        /// Catalog id to use instead of the slug lookup
        #[arg(long)]
        id: Option<String>,
    },

    /// Show one character by slug
    Character {
        /// Character slug, e.g. `luke-skywalker`
        slug: String,

        /// Catalog id to use instead of the slug lookup
        #[arg(long)]
        id: Option<String>,
    },

    /// Search the metadata provider for a character name
    Search {
        name: String,
    },

    /// Resolve and cache posters for the whole catalog
    Posters,

    /// Inspect or reset the image URL cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CacheAction {
    /// Print every cached key and URL
    Show,
    /// Remove every cached entry
    Clear,
}
