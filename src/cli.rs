use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lookback", version, about = "Infinite-scroll journal calendar")]
pub struct Cli {
    /// Remote journal feed URL
    #[arg(long, global = true, default_value = crate::storage::DEFAULT_FEED_URL)]
    pub feed: String,

    /// Path to the local entry store (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List journal entries, optionally filtered
    List {
        /// Case-insensitive text match over descriptions and categories
        #[arg(long)]
        text: Option<String>,
        /// Exact category match
        #[arg(long)]
        category: Option<String>,
        /// Keep only entries rated at least this highly
        #[arg(long)]
        min_rating: Option<i64>,
        /// Skip the remote feed, list local entries only
        #[arg(long)]
        no_remote: bool,
    },
    /// Add a local journal entry
    Add {
        /// Calendar day, YYYY-MM-DD
        date: String,
        #[arg(long)]
        image: Option<String>,
        /// Rating from 1 to 5
        #[arg(long)]
        rating: Option<i64>,
        /// Category tag, may be given more than once
        #[arg(short, long = "category")]
        categories: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Edit a local journal entry
    Edit {
        entry_id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        rating: Option<i64>,
        /// Replace the category set, may be given more than once
        #[arg(short, long = "category")]
        categories: Vec<String>,
        #[arg(long)]
        clear_categories: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        clear_rating: bool,
    },
    /// Delete a local journal entry
    Delete { entry_id: String },
    /// Open the interactive calendar (the default)
    Tui,
}
