use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Read, search and sample a text corpus.
#[derive(Debug, Parser)]
#[command(name = "lectio", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Load every unit before running the command
    #[arg(long, global = true)]
    pub warm: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a whole unit
    Unit { id: String },

    /// Print one section of a unit
    Section { unit: String, section: u32 },

    /// Print a single item
    Item { unit: String, section: u32, item: u32 },

    /// Search item text
    Search {
        query: String,
        /// Only search this collection
        #[arg(long, alias = "testament")]
        collection: Option<String>,
        /// Only search these units (repeatable)
        #[arg(long = "unit", value_name = "ID")]
        units: Vec<String>,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Look up a reference such as "John 3:16-18"
    Lookup { reference: String },

    /// Draw random items
    Random {
        #[arg(default_value_t = 1)]
        count: usize,
        #[arg(long, alias = "testament")]
        collection: Option<String>,
        #[arg(long = "unit", value_name = "ID")]
        units: Vec<String>,
        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
        /// Print a single item in the bible-api.com random verse format
        #[arg(long, conflicts_with = "count")]
        verse: bool,
    },

    /// Show cache statistics
    Stats,
}
