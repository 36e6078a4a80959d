use crate::model::{clamp_rating, EntryDraft, FilterState, Journal, JournalEntry, JournalError};
use crate::storage::{fetch_remote_journal, load_local_events, local_store_path, save_local_events};
use crate::ui;
use crate::date::parse_ymd;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

pub fn list(
    feed: String,
    store: Option<PathBuf>,
    text: Option<String>,
    category: Option<String>,
    min_rating: Option<i64>,
    no_remote: bool,
) -> Result<()> {
    let store = resolve_store(store)?;
    let remote = if no_remote {
        Vec::new()
    } else {
        fetch_remote_journal(&feed)
    };
    let journal = Journal::new(remote, load_local_events(&store));
    let filters = FilterState {
        text: text.unwrap_or_default(),
        category: category.unwrap_or_default(),
        min_rating: min_rating.map(clamp_rating),
    };
    let days = journal.by_day(&filters);
    if days.is_empty() {
        println!("(no entries)");
        return Ok(());
    }
    for (date, entries) in days {
        println!("{}", date);
        for entry in entries {
            print_entry(&entry);
        }
        println!();
    }
    Ok(())
}

pub fn add(
    store: Option<PathBuf>,
    date: String,
    image: Option<String>,
    rating: Option<i64>,
    categories: Vec<String>,
    description: String,
) -> Result<()> {
    let store = resolve_store(store)?;
    if parse_ymd(&date).is_none() {
        bail!("invalid date (use YYYY-MM-DD): {}", date);
    }
    let mut journal = Journal::new(Vec::new(), load_local_events(&store));
    let id = journal.create_local(EntryDraft {
        date,
        image_url: image,
        rating: rating.map(clamp_rating),
        categories,
        description,
    });
    save_local_events(&store, &journal.local)?;
    println!("Added entry {}", id);
    Ok(())
}

pub fn edit(
    store: Option<PathBuf>,
    entry_id: String,
    date: Option<String>,
    image: Option<String>,
    rating: Option<i64>,
    categories: Vec<String>,
    clear_categories: bool,
    description: Option<String>,
    clear_rating: bool,
) -> Result<()> {
    let store = resolve_store(store)?;
    if let Some(ref d) = date {
        if parse_ymd(d).is_none() {
            bail!("invalid date (use YYYY-MM-DD): {}", d);
        }
    }
    let mut journal = Journal::new(Vec::new(), load_local_events(&store));
    journal
        .update_local(&entry_id, |entry| {
            if let Some(d) = date.clone() {
                entry.date = d;
            }
            if let Some(url) = image.clone() {
                entry.image_url = if url.is_empty() { None } else { Some(url) };
            }
            if clear_rating {
                entry.rating = None;
            }
            if let Some(r) = rating {
                entry.rating = Some(clamp_rating(r));
            }
            if clear_categories {
                entry.categories.clear();
            }
            if !categories.is_empty() {
                entry.categories = categories.clone();
            }
            if let Some(desc) = description.clone() {
                entry.description = desc;
            }
        })
        .map_err(|err| match err {
            JournalError::NotFound(id) => anyhow!("entry {} not found", id),
            other => other.into(),
        })?;
    save_local_events(&store, &journal.local)?;
    println!("Updated entry {}", entry_id);
    Ok(())
}

pub fn delete(store: Option<PathBuf>, entry_id: String) -> Result<()> {
    let store = resolve_store(store)?;
    let mut journal = Journal::new(Vec::new(), load_local_events(&store));
    journal
        .delete_local(&entry_id)
        .map_err(|err| match err {
            JournalError::NotFound(id) => anyhow!("entry {} not found", id),
            other => other.into(),
        })?;
    save_local_events(&store, &journal.local)?;
    println!("Deleted entry {}", entry_id);
    Ok(())
}

pub fn tui(feed: String, store: Option<PathBuf>) -> Result<()> {
    let store = resolve_store(store)?;
    let journal = Journal::new(Vec::new(), load_local_events(&store));
    ui::run(journal, store, feed)
}

fn resolve_store(store: Option<PathBuf>) -> Result<PathBuf> {
    match store {
        Some(path) => Ok(path),
        None => local_store_path(),
    }
}

fn print_entry(entry: &JournalEntry) {
    let origin = match entry.source {
        crate::model::Source::Remote => "remote",
        crate::model::Source::Local => "local",
    };
    println!("  - {} ({})", entry.id, origin);
    if !entry.description.is_empty() {
        println!("    {}", entry.description);
    }
    if let Some(rating) = entry.rating {
        println!("    rating: {}/5", rating);
    }
    if !entry.categories.is_empty() {
        println!("    categories: {}", entry.categories.join(", "));
    }
    if let Some(url) = &entry.image_url {
        println!("    image: {}", url);
    }
}
