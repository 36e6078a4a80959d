mod cli;
mod commands;
mod date;
mod model;
mod storage;
mod ui;
mod window;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::List {
            text,
            category,
            min_rating,
            no_remote,
        } => commands::list(args.feed, args.store, text, category, min_rating, no_remote),
        cli::Command::Add {
            date,
            image,
            rating,
            categories,
            description,
        } => commands::add(args.store, date, image, rating, categories, description),
        cli::Command::Edit {
            entry_id,
            date,
            image,
            rating,
            categories,
            clear_categories,
            description,
            clear_rating,
        } => commands::edit(
            args.store,
            entry_id,
            date,
            image,
            rating,
            categories,
            clear_categories,
            description,
            clear_rating,
        ),
        cli::Command::Delete { entry_id } => commands::delete(args.store, entry_id),
        cli::Command::Tui => commands::tui(args.feed, args.store),
    }
}
